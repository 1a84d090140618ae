//! Authentication middleware: Bearer token extraction and access token verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use cinema_core::auth::jwt::{Claims, UserClaims};

use crate::AppState;
use crate::error::AppError;

/// Decoded access token claims, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims<UserClaims>);

/// Token from an `Authorization: Bearer <token>` header value.
fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let header = header
        .ok_or_else(|| AppError::Unauthorized("Authorization header is missing".into()))?;

    let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AppError::Unauthorized(
            "Invalid Authorization header format. Expected 'Bearer <token>'".into(),
        ));
    }
    Ok(token)
}

/// Axum middleware: extracts the bearer token, verifies it as an access token,
/// and injects [`AuthenticatedUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = bearer_token(header)?;

    let claims = state
        .jwt
        .decode_access_token::<UserClaims>(token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}
