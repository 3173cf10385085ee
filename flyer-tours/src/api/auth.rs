//! Authentication middleware for protected routes
//!
//! Protected routes expect `Authorization: Bearer <secret>`. When no secret
//! is configured every request passes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::AppState;

/// Authentication middleware
///
/// Returns 401 Unauthorized if the bearer token is missing or wrong.
/// Applied to protected routes only; `/health` does not use it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(secret) = state.api_secret.as_deref() else {
        return Ok(next.run(request).await);
    };

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?;

    if !tokens_match(secret, token.trim()) {
        warn!("Rejected request to {}: invalid token", request.uri().path());
        return Err(AuthError::InvalidToken);
    }

    Ok(next.run(request).await)
}

fn tokens_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    expected.len() == provided.len() && bool::from(expected.ct_eq(provided))
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    MalformedHeader,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing Authorization header",
            AuthError::MalformedHeader => "Authorization header must be 'Bearer <token>'",
            AuthError::InvalidToken => "Invalid token",
        };

        let body = Json(json!({
            "error": {
                "code": "UNAUTHORIZED",
                "message": message,
            }
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
