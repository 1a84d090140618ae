//! Movie catalog workflows: validate request bodies, call the catalog and
//! shape list responses.

use chrono::Utc;
use cinema_core::models::movies::{MovieChanges, MovieDetail, NewMovie};
use cinema_core::movies::catalog::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MoviePage};
use cinema_core::validation::{
    normalize_country_code, normalize_names, validate_amount, validate_movie_name,
    validate_release_date, validate_score,
};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    MessageResponse, MovieCreateRequest, MovieListQuery, MovieListResponse, MovieUpdateRequest,
};
use crate::routes::MOVIE_LIST_LINK;

pub const UPDATED_MESSAGE: &str = "Movie updated successfully.";

fn check(result: Result<(), String>) -> AppResult<()> {
    result.map_err(AppError::Validation)
}

fn page_link(page: i64, per_page: i64) -> String {
    format!("{MOVIE_LIST_LINK}?page={page}&per_page={per_page}")
}

fn list_response(page: MoviePage) -> MovieListResponse {
    MovieListResponse {
        prev_page: page
            .has_prev()
            .then(|| page_link(page.page - 1, page.per_page)),
        next_page: page
            .has_next()
            .then(|| page_link(page.page + 1, page.per_page)),
        total_pages: page.total_pages,
        total_items: page.total_items,
        movies: page.movies,
    }
}

pub async fn list_movies(state: &AppState, query: MovieListQuery) -> AppResult<MovieListResponse> {
    let page = state
        .catalog
        .list(
            query.page.unwrap_or(DEFAULT_PAGE),
            query.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
        .await?;
    Ok(list_response(page))
}

/// Validate and normalize a create request.
fn new_movie(req: MovieCreateRequest) -> AppResult<NewMovie> {
    let name = req.name.trim().to_string();
    check(validate_movie_name(&name))?;
    check(validate_release_date(req.date, Utc::now().date_naive()))?;
    check(validate_score(req.score))?;
    check(validate_amount("budget", req.budget))?;
    check(validate_amount("revenue", req.revenue))?;

    Ok(NewMovie {
        name,
        date: req.date,
        score: req.score,
        overview: req.overview,
        status: req.status,
        budget: req.budget,
        revenue: req.revenue,
        country: normalize_country_code(&req.country).map_err(AppError::Validation)?,
        genres: normalize_names("genres", &req.genres).map_err(AppError::Validation)?,
        actors: normalize_names("actors", &req.actors).map_err(AppError::Validation)?,
        languages: normalize_names("languages", &req.languages)
            .map_err(AppError::Validation)?,
    })
}

fn movie_changes(req: MovieUpdateRequest) -> AppResult<MovieChanges> {
    let name = req.name.map(|n| n.trim().to_string());
    if let Some(name) = &name {
        check(validate_movie_name(name))?;
    }
    if let Some(date) = req.date {
        check(validate_release_date(date, Utc::now().date_naive()))?;
    }
    if let Some(score) = req.score {
        check(validate_score(score))?;
    }
    if let Some(budget) = req.budget {
        check(validate_amount("budget", budget))?;
    }
    if let Some(revenue) = req.revenue {
        check(validate_amount("revenue", revenue))?;
    }

    Ok(MovieChanges {
        name,
        date: req.date,
        score: req.score,
        overview: req.overview,
        status: req.status,
        budget: req.budget,
        revenue: req.revenue,
    })
}

/// Create a movie, linking or creating its country, genres, actors and
/// languages.
pub async fn create_movie(state: &AppState, req: MovieCreateRequest) -> AppResult<MovieDetail> {
    let movie = new_movie(req)?;
    Ok(state.catalog.create(movie).await?)
}

pub async fn get_movie(state: &AppState, movie_id: i64) -> AppResult<MovieDetail> {
    Ok(state.catalog.get(movie_id).await?)
}

pub async fn delete_movie(state: &AppState, movie_id: i64) -> AppResult<()> {
    Ok(state.catalog.delete(movie_id).await?)
}

pub async fn update_movie(
    state: &AppState,
    movie_id: i64,
    req: MovieUpdateRequest,
) -> AppResult<MessageResponse> {
    let changes = movie_changes(req)?;
    state.catalog.update(movie_id, changes).await?;
    Ok(MessageResponse::new(UPDATED_MESSAGE))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate};
    use cinema_core::models::movies::MovieStatus;

    use super::*;

    fn request() -> MovieCreateRequest {
        MovieCreateRequest {
            name: "  New Movie ".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            score: 85.5,
            overview: "An amazing movie.".into(),
            status: MovieStatus::Released,
            budget: 1_000_000.0,
            revenue: 5_000_000.0,
            country: "us".into(),
            genres: vec!["science fiction".into(), "Science Fiction".into()],
            actors: vec!["jane doe".into()],
            languages: vec!["english".into()],
        }
    }

    #[test]
    fn create_request_is_normalized() {
        let movie = new_movie(request()).unwrap();
        assert_eq!(movie.name, "New Movie");
        assert_eq!(movie.country, "US");
        assert_eq!(movie.genres, ["Science Fiction"]);
        assert_eq!(movie.actors, ["Jane Doe"]);
        assert_eq!(movie.languages, ["English"]);
    }

    #[test]
    fn far_future_release_is_rejected() {
        let next_year = Utc::now().year() + 1;
        let mut req = request();
        req.date = NaiveDate::from_ymd_opt(next_year + 1, 1, 1).unwrap();
        let err = new_movie(req).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(m) if m == format!("The year in 'date' cannot be greater than {next_year}.")
        ));
    }

    #[test]
    fn update_validates_only_present_fields() {
        assert!(movie_changes(MovieUpdateRequest::default()).unwrap().is_empty());
        let err = movie_changes(MovieUpdateRequest {
            score: Some(101.0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn links_use_the_theater_prefix() {
        assert_eq!(page_link(3, 5), "/theater/movies/?page=3&per_page=5");
    }
}
