//! Paginated listing and CRUD over the movie catalog.

use std::sync::Arc;

use tracing::info;

use super::MovieError;
use super::store::MovieStore;
use crate::accounts::store::StoreError;
use crate::models::movies::{MovieChanges, MovieDetail, MovieSummary, NewMovie};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 20;

pub const NO_MOVIES_MESSAGE: &str = "No movies found.";
pub const MOVIE_NOT_FOUND_MESSAGE: &str = "Movie with the given ID was not found.";

/// One page of the catalog, newest first.
#[derive(Debug, Clone)]
pub struct MoviePage {
    pub movies: Vec<MovieSummary>,
    pub page: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl MoviePage {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Reads and writes movies.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn MovieStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self { store }
    }

    /// Fails with [`MovieError::NotFound`] when the page holds no movies,
    /// including every page of an empty catalog.
    pub async fn list(&self, page: i64, per_page: i64) -> Result<MoviePage, MovieError> {
        if page < 1 {
            return Err(MovieError::Validation(
                "page must be greater than or equal to 1.".into(),
            ));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(MovieError::Validation(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}."
            )));
        }
        let not_found = || MovieError::NotFound(NO_MOVIES_MESSAGE.into());
        let offset = (page - 1).checked_mul(per_page).ok_or_else(not_found)?;

        let total_items = self.store.count_movies().await?;
        let movies = self.store.list_movies(offset, per_page).await?;
        if movies.is_empty() {
            return Err(not_found());
        }

        Ok(MoviePage {
            movies,
            page,
            per_page,
            total_items,
            total_pages: (total_items + per_page - 1) / per_page,
        })
    }

    /// `movie` is expected to be validated and normalized already.
    pub async fn create(&self, movie: NewMovie) -> Result<MovieDetail, MovieError> {
        if self.store.movie_exists(&movie.name, movie.date).await? {
            return Err(MovieError::Conflict(format!(
                "A movie with the name '{}' and release date '{}' already exists.",
                movie.name, movie.date
            )));
        }

        let created = self
            .store
            .create_movie(movie)
            .await
            .map_err(constraint_as_invalid_input)?;

        info!(movie_id = created.id, name = %created.name, "Created movie");
        Ok(created)
    }

    pub async fn get(&self, movie_id: i64) -> Result<MovieDetail, MovieError> {
        self.store
            .find_movie(movie_id)
            .await?
            .ok_or_else(movie_not_found)
    }

    pub async fn delete(&self, movie_id: i64) -> Result<(), MovieError> {
        if !self.store.delete_movie(movie_id).await? {
            return Err(movie_not_found());
        }
        info!(movie_id, "Deleted movie");
        Ok(())
    }

    pub async fn update(&self, movie_id: i64, changes: MovieChanges) -> Result<(), MovieError> {
        let updated = self
            .store
            .update_movie(movie_id, changes)
            .await
            .map_err(constraint_as_invalid_input)?;
        if !updated {
            return Err(movie_not_found());
        }
        info!(movie_id, "Updated movie");
        Ok(())
    }
}

fn movie_not_found() -> MovieError {
    MovieError::NotFound(MOVIE_NOT_FOUND_MESSAGE.into())
}

fn constraint_as_invalid_input(e: StoreError) -> MovieError {
    match e {
        StoreError::Duplicate(_) => MovieError::InvalidInput,
        other => other.into(),
    }
}
