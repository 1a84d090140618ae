//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cinema_core::accounts::AccountError;
use cinema_core::auth::TokenError;
use cinema_core::movies::MovieError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 500 with a message safe to show to the client.
    #[error("Server error: {0}")]
    ServerError(String),

    /// 500 whose detail is logged and never returned.
    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.as_str()),
            AppError::Validation(m) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                m.as_str(),
            ),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::ServerError(m) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", m.as_str())
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired | TokenError::Invalid => AppError::BadRequest(e.to_string()),
            TokenError::Encoding(msg) => AppError::Internal(msg),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::NotFound(msg) => AppError::NotFound(msg),
            AccountError::Unauthorized(msg) => AppError::Unauthorized(msg),
            AccountError::Forbidden(msg) => AppError::Forbidden(msg),
            AccountError::Conflict(msg) => AppError::Conflict(msg),
            AccountError::AlreadyActive | AccountError::InvalidOrExpired => {
                AppError::BadRequest(e.to_string())
            }
            AccountError::Validation(msg) => AppError::Validation(msg),
            AccountError::Token(e) => AppError::from(e),
            AccountError::Persistence(e) => AppError::Internal(e.to_string()),
            AccountError::Auth(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<MovieError> for AppError {
    fn from(e: MovieError) -> Self {
        match e {
            MovieError::NotFound(msg) => AppError::NotFound(msg),
            MovieError::Conflict(msg) => AppError::Conflict(msg),
            MovieError::InvalidInput => AppError::BadRequest(e.to_string()),
            MovieError::Validation(msg) => AppError::Validation(msg),
            MovieError::Persistence(e) => AppError::Internal(e.to_string()),
        }
    }
}
