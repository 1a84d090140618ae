//! # cinema_core
//!
//! Core logic for Cinema: token codec, recovery tokens, sessions, the movie
//! catalog, validation and the storage, email and object-storage
//! collaborators.

pub mod accounts;
pub mod auth;
pub mod migrate;
pub mod models;
pub mod movies;
pub mod notifications;
pub mod storage;
pub mod validation;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
