//! Movie catalog: paginated listing and CRUD over movies and the countries,
//! genres, actors and languages they reference.
//!
//! [`catalog::Catalog`] is the component the API calls. Persistence goes
//! through [`store::MovieStore`], implemented for PostgreSQL in [`pg`]. An
//! in-memory implementation is available to tests behind the `test-util`
//! feature.

pub mod catalog;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod pg;
pub mod store;

use thiserror::Error;

use crate::accounts::store::StoreError;

/// Catalog workflow errors.
#[derive(Debug, Error)]
pub enum MovieError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A write violated a storage constraint.
    #[error("Invalid input data.")]
    InvalidInput,

    #[error("{0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}
