use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::models::{User, UserRole};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User id
    pub exp: usize,  // Expiration time
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),
}

pub fn create_token(user_id: Uuid, jwt_secret: &str, ttl_hours: i64) -> Result<String, TokenError> {
    let expiration = (Utc::now() + Duration::hours(ttl_hours)).timestamp().max(0) as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Uuid, TokenError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| TokenError::InvalidSubject(token_data.claims.sub))
}

/// What the identity provider vouches for when a user signs in. Arrives as
/// an HS256 JWT signed with the provider's shared secret.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(url)]
    pub profile_image_url: Option<String>,
    pub role: Option<UserRole>,
    pub exp: usize,
}

pub fn verify_identity(assertion: &str, idp_secret: &str) -> Result<IdentityClaims, TokenError> {
    let token_data = decode::<IdentityClaims>(
        assertion,
        &DecodingKey::from_secret(idp_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Resolves a session token to the current user row. The row is loaded
/// fresh so verification and subscription changes apply immediately.
pub async fn authenticate(state: &AppState, token: &str) -> Result<User, ApiError> {
    let user_id = validate_token(token, &state.config.jwt_secret).map_err(|e| {
        log::debug!("Rejected session token: {}", e);
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;
    state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(Some)
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

/// A request made with a valid session.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        authenticate(state, token).await.map(AuthUser)
    }
}

/// A request that may or may not carry a session. A malformed or expired
/// token is still rejected so the client knows to sign in again.
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers)? {
            Some(token) => authenticate(state, token).await.map(|user| MaybeUser(Some(user))),
            None => Ok(MaybeUser(None)),
        }
    }
}
