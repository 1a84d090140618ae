//! Storage seam for the movie catalog.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::accounts::store::StoreResult;
use crate::models::movies::{MovieChanges, MovieDetail, MovieSummary, NewMovie};

/// Persistence operations used by [`super::catalog::Catalog`].
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn count_movies(&self) -> StoreResult<i64>;

    /// Newest first (descending id).
    async fn list_movies(&self, offset: i64, limit: i64) -> StoreResult<Vec<MovieSummary>>;

    async fn movie_exists(&self, name: &str, date: NaiveDate) -> StoreResult<bool>;

    /// Insert a movie, creating any missing country, genres, actors and
    /// languages, in one transaction.
    ///
    /// Fails with [`crate::accounts::store::StoreError::Duplicate`] when a
    /// movie with the same name and date exists.
    async fn create_movie(&self, movie: NewMovie) -> StoreResult<MovieDetail>;

    async fn find_movie(&self, movie_id: i64) -> StoreResult<Option<MovieDetail>>;

    /// Delete a movie and its links. Returns whether a row was removed.
    async fn delete_movie(&self, movie_id: i64) -> StoreResult<bool>;

    /// Apply `changes` to the movie's own columns. Returns `false` when the
    /// movie does not exist.
    ///
    /// Fails with [`crate::accounts::store::StoreError::Duplicate`] when the
    /// new name and date collide with another movie.
    async fn update_movie(&self, movie_id: i64, changes: MovieChanges) -> StoreResult<bool>;
}
