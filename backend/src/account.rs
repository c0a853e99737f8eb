//! Sign-in, the caller's own profile and subscription activation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::access;
use crate::app::AppState;
use crate::auth::{self, AuthUser};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::{
    nullable, Language, NewUser, ProfileChanges, SubscriptionPlan, SubscriptionStatus, User,
    UserRole,
};

/// A user as the client sees it, with the derived privileges precomputed so
/// the UI never has to re-implement the rules.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub effective_subscription_status: SubscriptionStatus,
    pub can_create_property: bool,
    pub can_view_contacts: bool,
    /// The stored flag or the configured allow-list.
    pub has_admin_access: bool,
}

impl UserView {
    pub fn new(user: User, config: &AppConfig) -> Self {
        let now = Utc::now();
        let effective_subscription_status = access::effective_status(&user, now);
        let can_create_property = access::can_create_property(&user, config, now).is_ok();
        let has_admin_access = access::is_admin(&user, config);
        let can_view_contacts =
            has_admin_access || effective_subscription_status == SubscriptionStatus::Active;
        Self {
            user,
            effective_subscription_status,
            can_create_property,
            can_view_contacts,
            has_admin_access,
        }
    }
}

/// Sign-in body. `assertion` is the identity provider's signed token; any
/// other claim in the body is ignored.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub assertion: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 100))]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(min = 6, max = 30))]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(url)]
    pub profile_image_url: Option<Option<String>>,
    pub preferred_language: Option<Language>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    #[serde(rename = "type")]
    pub plan: SubscriptionPlan,
}

fn tidy(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Exchanges an identity-provider assertion for a session. Unsigned or
/// forged claims never reach the store.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let assertion = body
        .assertion
        .ok_or_else(|| ApiError::Unauthorized("Missing identity assertion".to_string()))?;
    let claims = auth::verify_identity(&assertion, &state.config.idp_secret).map_err(|e| {
        log::warn!("Rejected identity assertion: {}", e);
        ApiError::Unauthorized("Invalid identity assertion".to_string())
    })?;
    claims.validate()?;

    let user = state
        .store
        .upsert_user(NewUser {
            email: claims.email.trim().to_lowercase(),
            first_name: tidy(claims.first_name),
            last_name: tidy(claims.last_name),
            profile_image_url: tidy(claims.profile_image_url),
            role: claims.role.unwrap_or(UserRole::Renter),
        })
        .await?;
    let token = auth::create_token(user.id, &state.config.jwt_secret, state.config.jwt_ttl_hours)
        .map_err(|e| {
            log::error!("Failed to issue token for {}: {}", user.id, e);
            ApiError::Internal("Could not issue a session token".to_string())
        })?;
    log::info!("User {} signed in", user.id);
    Ok(Json(LoginResponse {
        token,
        user: UserView::new(user, &state.config),
    }))
}

pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<UserView> {
    Json(UserView::new(user, &state.config))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserView>, ApiError> {
    body.validate()?;
    let changes = ProfileChanges {
        first_name: body.first_name.map(tidy),
        last_name: body.last_name.map(tidy),
        phone: body.phone.map(tidy),
        profile_image_url: body.profile_image_url.map(tidy),
        preferred_language: body.preferred_language,
        role: body.role,
    };
    let updated = state
        .store
        .update_profile(user.id, changes)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(UserView::new(updated, &state.config)))
}

/// Deletes the caller's account with its listings and conversations.
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_user(user.id).await? {
        return Err(ApiError::NotFound("User"));
    }
    log::info!("User {} deleted their account", user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// Starts a subscription period from now. Payment is settled elsewhere.
pub async fn activate_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<SubscriptionRequest>,
) -> Result<Json<UserView>, ApiError> {
    let expires_at = Utc::now() + body.plan.duration();
    let updated = state
        .store
        .activate_subscription(user.id, body.plan, expires_at)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    log::info!("User {} subscribed {} until {}", user.id, body.plan, expires_at);
    Ok(Json(UserView::new(updated, &state.config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_clear_profile_fields() {
        assert_eq!(tidy(Some("  ".to_string())), None);
        assert_eq!(tidy(Some(" Douala ".to_string())), Some("Douala".to_string()));
    }

    #[test]
    fn profile_update_distinguishes_null_from_missing() {
        let body: UpdateProfileRequest =
            serde_json::from_str(r#"{"phone":null,"preferredLanguage":"en"}"#).unwrap();
        assert_eq!(body.phone, Some(None));
        assert_eq!(body.first_name, None);
        assert_eq!(body.preferred_language, Some(Language::En));
    }

    #[test]
    fn profile_update_rejects_malformed_fields() {
        let body: UpdateProfileRequest =
            serde_json::from_str(r#"{"phone":"12","profileImageUrl":"pas une url"}"#).unwrap();
        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("profile_image_url"));

        let cleared: UpdateProfileRequest =
            serde_json::from_str(r#"{"phone":null,"profileImageUrl":null}"#).unwrap();
        assert!(cleared.validate().is_ok());
    }

    #[test]
    fn subscription_body_uses_type_key() {
        let body: SubscriptionRequest = serde_json::from_str(r#"{"type":"yearly"}"#).unwrap();
        assert_eq!(body.plan, SubscriptionPlan::Yearly);
    }
}
