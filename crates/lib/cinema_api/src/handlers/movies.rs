//! Movie catalog request handlers.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use cinema_core::models::movies::MovieDetail;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    MessageResponse, MovieCreateRequest, MovieListQuery, MovieListResponse, MovieUpdateRequest,
};
use crate::services::movies;

/// `GET /theater/movies/?page=&per_page=`: one page of movies, newest first.
pub async fn list_movies_handler(
    State(state): State<AppState>,
    query: Result<Query<MovieListQuery>, QueryRejection>,
) -> AppResult<Json<MovieListResponse>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let resp = movies::list_movies(&state, query).await?;
    Ok(Json(resp))
}

/// `POST /theater/movies/`
pub async fn create_movie_handler(
    State(state): State<AppState>,
    Json(body): Json<MovieCreateRequest>,
) -> AppResult<(StatusCode, Json<MovieDetail>)> {
    let resp = movies::create_movie(&state, body).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `GET /theater/movies/{movie_id}/`
pub async fn get_movie_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<MovieDetail>> {
    let resp = movies::get_movie(&state, movie_id).await?;
    Ok(Json(resp))
}

/// `DELETE /theater/movies/{movie_id}/`
pub async fn delete_movie_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<StatusCode> {
    movies::delete_movie(&state, movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /theater/movies/{movie_id}/`: update the movie's own fields.
pub async fn update_movie_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Json(body): Json<MovieUpdateRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = movies::update_movie(&state, movie_id, body).await?;
    Ok(Json(resp))
}
