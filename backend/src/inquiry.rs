use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{Inquiry, InquiryStatus, NewInquiry};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInquiryRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 30))]
    pub phone: Option<String>,
    #[validate(length(min = 10, max = 2000))]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInquiryRequest {
    pub status: InquiryStatus,
}

/// Anyone may ask about an active listing; no session needed.
pub async fn create_inquiry(
    State(state): State<AppState>,
    Path(property_id): Path<i32>,
    Json(body): Json<CreateInquiryRequest>,
) -> Result<(StatusCode, Json<Inquiry>), ApiError> {
    state
        .store
        .get_property(property_id)
        .await?
        .filter(|record| record.property.is_active)
        .ok_or(ApiError::NotFound("Property"))?;
    body.validate()?;

    let inquiry = state
        .store
        .create_inquiry(NewInquiry {
            property_id,
            name: body.name.trim().to_string(),
            email: body.email.trim().to_lowercase(),
            phone: body.phone.map(|p| p.trim().to_string()),
            message: body.message.trim().to_string(),
            status: InquiryStatus::Pending,
        })
        .await?;
    log::info!("Inquiry {} received for property {}", inquiry.id, property_id);
    Ok((StatusCode::CREATED, Json(inquiry)))
}

pub async fn landlord_inquiries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Inquiry>>, ApiError> {
    Ok(Json(state.store.inquiries_for_landlord(user.id).await?))
}

pub async fn update_inquiry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    Json(body): Json<UpdateInquiryRequest>,
) -> Result<Json<Inquiry>, ApiError> {
    let inquiry = state
        .store
        .update_inquiry_status(id, user.id, body.status)
        .await?
        .ok_or(ApiError::NotFound("Inquiry"))?;
    log::info!("Inquiry {} marked {}", id, inquiry.status);
    Ok(Json(inquiry))
}
