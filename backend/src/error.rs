use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use validator::ValidationErrors;

use crate::access::Denial;
use crate::store::StoreError;

/// Every failure a route handler can report. Converted to a JSON body of the
/// form `{"message": ..}` plus `errors` for validation failures and
/// `requires` for access denials the client can upsell on.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    AccessDenied(Denial),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::AccessDenied(_) | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text safe to show a client. Storage failures are logged and
    /// replaced with a generic message.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Store(StoreError::Conflict(message)) => message.clone(),
            ApiError::Store(e) => {
                log::error!("Request failed: {}", e);
                "Internal server error".to_string()
            }
            ApiError::Internal(detail) => {
                log::error!("Request failed: {}", detail);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => json!({
                "message": self.public_message(),
                "errors": errors,
            }),
            ApiError::AccessDenied(denial) => json!({
                "message": self.public_message(),
                "requires": denial.requirement(),
            }),
            _ => json!({ "message": self.public_message() }),
        };
        (status, Json(body)).into_response()
    }
}
