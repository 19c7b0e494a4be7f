//! Platform user token authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

use crate::state::AppState;

/// Record type the platform puts in user auth tokens
pub const AUTH_RECORD_TYPE: &str = "authRecord";

/// Claims of a platform-issued user auth token
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    /// Local user id
    pub id: String,
    #[serde(rename = "type")]
    pub token_type: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated user identity extracted from the token
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
}

/// Create an auth token for a user
pub fn create_token(
    user_id: &str,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = UserClaims {
        id: user_id.to_string(),
        token_type: AUTH_RECORD_TYPE.to_string(),
        exp: (now + ttl).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a raw token (an optional `Bearer ` prefix is tolerated)
pub fn verify_token(token: &str, secret: &str) -> Result<UserIdentity, AppError> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
    if token.is_empty() {
        return Err(AppError::not_authenticated().with_detail("reason", "empty token"));
    }

    let token_data = jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Token validation failed: {e}");
        let reason = match e.kind() {
            ErrorKind::ExpiredSignature => "token expired",
            _ => "invalid token",
        };
        AppError::not_authenticated().with_detail("reason", reason)
    })?;

    if token_data.claims.token_type != AUTH_RECORD_TYPE {
        return Err(AppError::not_authenticated().with_detail("reason", "not a user token"));
    }

    Ok(UserIdentity {
        user_id: token_data.claims.id,
    })
}

/// Middleware that verifies the `Authorization` token and inserts [`UserIdentity`]
pub async fn user_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::not_authenticated()
                .with_detail("reason", "missing Authorization header")
                .into_response()
        })?;

    let identity =
        verify_token(token, &state.auth_token_secret).map_err(IntoResponse::into_response)?;

    tracing::debug!(user_id = %identity.user_id, "User authenticated");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
