//! Authentication primitives.
//!
//! Provides password hashing and the JWT codec shared by the session and
//! recovery flows in [`crate::accounts`].

pub mod jwt;
pub mod password;

use thiserror::Error;

/// Failures raised while decoding or minting signed tokens.
///
/// Decoding only ever yields [`TokenError::Expired`] or [`TokenError::Invalid`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token has expired.")]
    Expired,

    #[error("Invalid token.")]
    Invalid,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Authentication setup and hashing errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}
