//! In-memory movie store for tests that run without PostgreSQL.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::store::MovieStore;
use crate::accounts::store::{StoreError, StoreResult};
use crate::models::movies::{
    Country, MovieChanges, MovieDetail, MovieStatus, MovieSummary, NamedEntity, NewMovie,
};

struct MovieRow {
    id: i64,
    name: String,
    date: NaiveDate,
    score: f64,
    overview: String,
    status: MovieStatus,
    budget: f64,
    revenue: f64,
    country_id: i64,
    genre_ids: Vec<i64>,
    actor_ids: Vec<i64>,
    language_ids: Vec<i64>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    countries: Vec<Country>,
    genres: Vec<NamedEntity>,
    actors: Vec<NamedEntity>,
    languages: Vec<NamedEntity>,
    movies: Vec<MovieRow>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn country_id(&mut self, code: &str) -> i64 {
        if let Some(country) = self.countries.iter().find(|c| c.code == code) {
            return country.id;
        }
        let id = self.next_id();
        self.countries.push(Country {
            id,
            code: code.to_string(),
            name: None,
        });
        id
    }

    fn named_ids(
        &mut self,
        pick: fn(&mut Tables) -> &mut Vec<NamedEntity>,
        names: &[String],
    ) -> Vec<i64> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let existing = pick(self).iter().find(|e| &e.name == name).map(|e| e.id);
            let id = match existing {
                Some(id) => id,
                None => {
                    let id = self.next_id();
                    pick(self).push(NamedEntity {
                        id,
                        name: name.clone(),
                    });
                    id
                }
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    fn collides(&self, name: &str, date: NaiveDate, except: Option<i64>) -> bool {
        self.movies
            .iter()
            .any(|m| Some(m.id) != except && m.name == name && m.date == date)
    }

    fn detail(&self, row: &MovieRow) -> MovieDetail {
        let related = |table: &[NamedEntity], ids: &[i64]| {
            let mut out: Vec<NamedEntity> = table
                .iter()
                .filter(|e| ids.contains(&e.id))
                .cloned()
                .collect();
            out.sort_by(|a, b| a.name.cmp(&b.name));
            out
        };
        let country = self
            .countries
            .iter()
            .find(|c| c.id == row.country_id)
            .cloned()
            .unwrap_or(Country {
                id: row.country_id,
                code: String::new(),
                name: None,
            });
        MovieDetail {
            id: row.id,
            name: row.name.clone(),
            date: row.date,
            score: row.score,
            overview: row.overview.clone(),
            status: row.status,
            budget: row.budget,
            revenue: row.revenue,
            country,
            genres: related(&self.genres, &row.genre_ids),
            actors: related(&self.actors, &row.actor_ids),
            languages: related(&self.languages, &row.language_ids),
        }
    }
}

/// `NUMERIC(15, 2)` keeps cents.
fn to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// [`MovieStore`] kept entirely in process memory.
#[derive(Default)]
pub struct MemoryMovieStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }

    pub async fn countries(&self) -> Vec<Country> {
        self.tables.lock().await.countries.clone()
    }

    pub async fn genres(&self) -> Vec<NamedEntity> {
        self.tables.lock().await.genres.clone()
    }

    pub async fn actors(&self) -> Vec<NamedEntity> {
        self.tables.lock().await.actors.clone()
    }

    pub async fn languages(&self) -> Vec<NamedEntity> {
        self.tables.lock().await.languages.clone()
    }
}

#[async_trait]
impl MovieStore for MemoryMovieStore {
    async fn count_movies(&self) -> StoreResult<i64> {
        Ok(self.tables.lock().await.movies.len() as i64)
    }

    async fn list_movies(&self, offset: i64, limit: i64) -> StoreResult<Vec<MovieSummary>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&MovieRow> = tables.movies.iter().collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|m| MovieSummary {
                id: m.id,
                name: m.name.clone(),
                date: m.date,
                score: m.score,
                overview: m.overview.clone(),
            })
            .collect())
    }

    async fn movie_exists(&self, name: &str, date: NaiveDate) -> StoreResult<bool> {
        Ok(self.tables.lock().await.collides(name, date, None))
    }

    async fn create_movie(&self, movie: NewMovie) -> StoreResult<MovieDetail> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        if tables.collides(&movie.name, movie.date, None) {
            return Err(StoreError::Duplicate(format!(
                "movie '{}' ({})",
                movie.name, movie.date
            )));
        }

        let country_id = tables.country_id(&movie.country);
        let genre_ids = tables.named_ids(|t| &mut t.genres, &movie.genres);
        let actor_ids = tables.named_ids(|t| &mut t.actors, &movie.actors);
        let language_ids = tables.named_ids(|t| &mut t.languages, &movie.languages);
        let row = MovieRow {
            id: tables.next_id(),
            name: movie.name,
            date: movie.date,
            score: movie.score,
            overview: movie.overview,
            status: movie.status,
            budget: to_cents(movie.budget),
            revenue: movie.revenue,
            country_id,
            genre_ids,
            actor_ids,
            language_ids,
        };
        let detail = tables.detail(&row);
        tables.movies.push(row);
        Ok(detail)
    }

    async fn find_movie(&self, movie_id: i64) -> StoreResult<Option<MovieDetail>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .movies
            .iter()
            .find(|m| m.id == movie_id)
            .map(|m| tables.detail(m)))
    }

    async fn delete_movie(&self, movie_id: i64) -> StoreResult<bool> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        let before = tables.movies.len();
        tables.movies.retain(|m| m.id != movie_id);
        Ok(tables.movies.len() != before)
    }

    async fn update_movie(&self, movie_id: i64, changes: MovieChanges) -> StoreResult<bool> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        let Some(current) = tables.movies.iter().find(|m| m.id == movie_id) else {
            return Ok(false);
        };

        let name = changes.name.clone().unwrap_or_else(|| current.name.clone());
        let date = changes.date.unwrap_or(current.date);
        if tables.collides(&name, date, Some(movie_id)) {
            return Err(StoreError::Duplicate(format!("movie {movie_id}")));
        }

        let Some(row) = tables.movies.iter_mut().find(|m| m.id == movie_id) else {
            return Ok(false);
        };
        row.name = name;
        row.date = date;
        if let Some(score) = changes.score {
            row.score = score;
        }
        if let Some(overview) = changes.overview {
            row.overview = overview;
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        if let Some(budget) = changes.budget {
            row.budget = to_cents(budget);
        }
        if let Some(revenue) = changes.revenue {
            row.revenue = revenue;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_movie(name: &str, genres: &[&str]) -> NewMovie {
        NewMovie {
            name: name.into(),
            date: NaiveDate::from_ymd_opt(2020, 7, 20).unwrap(),
            score: 70.0,
            overview: "Overview".into(),
            status: MovieStatus::Released,
            budget: 1234.567,
            revenue: 5_000_000.0,
            country: "US".into(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            actors: vec!["Jane Doe".into()],
            languages: vec!["English".into()],
        }
    }

    #[tokio::test]
    async fn related_entities_are_shared_between_movies() {
        let store = MemoryMovieStore::new();
        let first = store
            .create_movie(new_movie("First", &["Drama", "Action"]))
            .await
            .unwrap();
        let second = store
            .create_movie(new_movie("Second", &["Action"]))
            .await
            .unwrap();

        let names: Vec<&str> = first.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Action", "Drama"]);
        assert_eq!(second.genres, vec![first.genres[0].clone()]);
        assert_eq!(first.country, second.country);
        assert_eq!(store.genres().await.len(), 2);
        assert_eq!(store.countries().await.len(), 1);
        assert_eq!(first.budget, 1234.57);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let store = MemoryMovieStore::new();
        for name in ["A", "B", "C"] {
            store.create_movie(new_movie(name, &[])).await.unwrap();
        }
        let page = store.list_movies(1, 5).await.unwrap();
        let names: Vec<&str> = page.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(store.count_movies().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn update_into_existing_name_and_date_is_duplicate() {
        let store = MemoryMovieStore::new();
        store.create_movie(new_movie("Taken", &[])).await.unwrap();
        let other = store.create_movie(new_movie("Other", &[])).await.unwrap();

        let changes = MovieChanges {
            name: Some("Taken".into()),
            ..Default::default()
        };
        let err = store.update_movie(other.id, changes).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(!store.update_movie(999, MovieChanges::default()).await.unwrap());
    }
}
