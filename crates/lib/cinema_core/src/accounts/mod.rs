//! Accounts: users, recovery tokens and sessions.
//!
//! [`users::Users`], [`recovery::RecoveryTokens`] and [`session::SessionManager`]
//! are the components the API orchestrates. All persistence goes through the
//! [`store::AccountStore`] trait, implemented for PostgreSQL in [`pg`]. An
//! in-memory implementation is available to tests behind the `test-util`
//! feature.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod pg;
pub mod recovery;
pub mod session;
pub mod store;
pub mod users;

use thiserror::Error;

use crate::auth::{AuthError, TokenError};
use store::StoreError;

/// Account workflow errors.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("User account is already active.")]
    AlreadyActive,

    #[error("Invalid or expired token.")]
    InvalidOrExpired,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
