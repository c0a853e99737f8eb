use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::auth::MaybeUser;
use crate::error::ApiError;
use crate::models::{NewReview, Review};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    /// Falls back to the session user's name when omitted.
    #[validate(length(min = 2, max = 100))]
    pub reviewer_name: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(min = 5, max = 2000))]
    pub comment: String,
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(property_id): Path<i32>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.store.reviews_for_property(property_id).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(property_id): Path<i32>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    state
        .store
        .get_property(property_id)
        .await?
        .ok_or(ApiError::NotFound("Property"))?;
    body.validate()?;

    let reviewer_name = match (body.reviewer_name, &user) {
        (Some(name), _) => name.trim().to_string(),
        (None, Some(user)) => user.display_name(),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "A reviewer name is required".to_string(),
            ))
        }
    };
    let review = state
        .store
        .create_review(NewReview {
            property_id,
            user_id: user.as_ref().map(|u| u.id),
            reviewer_name,
            rating: body.rating,
            comment: body.comment.trim().to_string(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn mark_helpful(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Review>, ApiError> {
    state
        .store
        .mark_review_helpful(id)
        .await?
        .ok_or(ApiError::NotFound("Review"))
        .map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        for (rating, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let request = CreateReviewRequest {
                reviewer_name: Some("Brice".to_string()),
                rating,
                comment: "Quartier calme, eau courante.".to_string(),
            };
            assert_eq!(request.validate().is_ok(), ok, "rating {}", rating);
        }
    }
}
