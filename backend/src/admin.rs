use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::access;
use crate::account::UserView;
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{nullable, AdminUserChanges, Review, SubscriptionPlan, SubscriptionStatus, User};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRequest {
    pub is_verified: Option<bool>,
    pub is_admin: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub subscription_type: Option<Option<SubscriptionPlan>>,
    pub subscription_status: Option<SubscriptionStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub subscription_expires_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReviewRequest {
    pub is_verified: bool,
}

fn require_admin(state: &AppState, user: &User) -> Result<(), ApiError> {
    if access::is_admin(user, &state.config) {
        Ok(())
    } else {
        log::warn!("User {} attempted an admin action", user.id);
        Err(ApiError::Forbidden("Administrator access required".to_string()))
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AdminUserRequest>,
) -> Result<Json<UserView>, ApiError> {
    require_admin(&state, &admin)?;
    let changes = AdminUserChanges {
        is_verified: body.is_verified,
        is_admin: body.is_admin,
        subscription_type: body.subscription_type,
        subscription_status: body.subscription_status,
        subscription_expires_at: body.subscription_expires_at,
    };
    let user = state
        .store
        .update_user_admin(id, changes)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    log::info!("Admin {} updated user {}", admin.id, id);
    Ok(Json(UserView::new(user, &state.config)))
}

pub async fn moderate_review(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<i32>,
    Json(body): Json<ModerateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    require_admin(&state, &admin)?;
    let review = state
        .store
        .set_review_verified(id, body.is_verified)
        .await?
        .ok_or(ApiError::NotFound("Review"))?;
    log::info!("Admin {} set review {} verified={}", admin.id, id, body.is_verified);
    Ok(Json(review))
}
