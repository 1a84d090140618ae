//! PostgreSQL movie store.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

use super::store::MovieStore;
use crate::accounts::pg::{decode_error, duplicate_or_db};
use crate::accounts::store::StoreResult;
use crate::models::movies::{
    Country, MovieChanges, MovieDetail, MovieSummary, NamedEntity, NewMovie,
};

const SUMMARY_COLUMNS: &str = "id, name, date, score, overview";

const DETAIL_COLUMNS: &str = "m.id, m.name, m.date, m.score, m.overview, m.status::text, \
     m.budget::float8, m.revenue, c.id, c.code, c.name";

type SummaryRow = (i64, String, NaiveDate, f64, String);

type DetailRow = (
    i64,
    String,
    NaiveDate,
    f64,
    String,
    String,
    f64,
    f64,
    i64,
    String,
    Option<String>,
);

/// Name-keyed tables a movie links to.
#[derive(Debug, Clone, Copy)]
enum Related {
    Genres,
    Actors,
    Languages,
}

impl Related {
    fn table(self) -> &'static str {
        match self {
            Related::Genres => "genres",
            Related::Actors => "actors",
            Related::Languages => "languages",
        }
    }

    fn link_table(self) -> &'static str {
        match self {
            Related::Genres => "movies_genres",
            Related::Actors => "actors_movies",
            Related::Languages => "movies_languages",
        }
    }

    fn link_column(self) -> &'static str {
        match self {
            Related::Genres => "genre_id",
            Related::Actors => "actor_id",
            Related::Languages => "language_id",
        }
    }
}

fn summary_from_row(row: SummaryRow) -> MovieSummary {
    let (id, name, date, score, overview) = row;
    MovieSummary {
        id,
        name,
        date,
        score,
        overview,
    }
}

fn named_from_row((id, name): (i64, String)) -> NamedEntity {
    NamedEntity { id, name }
}

/// Fetch the movie with its country; related lists are left empty.
async fn fetch_detail<'e, E>(executor: E, movie_id: i64) -> StoreResult<Option<MovieDetail>>
where
    E: sqlx::PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {DETAIL_COLUMNS} FROM movies m \
         JOIN countries c ON c.id = m.country_id \
         WHERE m.id = $1"
    );
    let row = sqlx::query_as::<_, DetailRow>(&sql)
        .bind(movie_id)
        .fetch_optional(executor)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let (id, name, date, score, overview, status, budget, revenue, c_id, c_code, c_name) = row;
    Ok(Some(MovieDetail {
        id,
        name,
        date,
        score,
        overview,
        status: status.parse().map_err(decode_error)?,
        budget,
        revenue,
        country: Country {
            id: c_id,
            code: c_code,
            name: c_name,
        },
        genres: Vec::new(),
        actors: Vec::new(),
        languages: Vec::new(),
    }))
}

async fn fetch_related<'e, E>(
    executor: E,
    related: Related,
    movie_id: i64,
) -> StoreResult<Vec<NamedEntity>>
where
    E: sqlx::PgExecutor<'e>,
{
    let sql = format!(
        "SELECT r.id, r.name FROM {} r \
         JOIN {} l ON l.{} = r.id \
         WHERE l.movie_id = $1 \
         ORDER BY r.name",
        related.table(),
        related.link_table(),
        related.link_column()
    );
    let rows = sqlx::query_as::<_, (i64, String)>(&sql)
        .bind(movie_id)
        .fetch_all(executor)
        .await?;
    Ok(rows.into_iter().map(named_from_row).collect())
}

/// Get-or-create each name and link it to the movie.
async fn link_related(
    tx: &mut Transaction<'_, Postgres>,
    related: Related,
    movie_id: i64,
    names: &[String],
) -> StoreResult<()> {
    let upsert = format!(
        "INSERT INTO {table} (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
        table = related.table()
    );
    let link = format!(
        "INSERT INTO {} (movie_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        related.link_table(),
        related.link_column()
    );
    for name in names {
        let related_id: i64 = sqlx::query_scalar(&upsert)
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;
        sqlx::query(&link)
            .bind(movie_id)
            .bind(related_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// [`MovieStore`] backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgMovieStore {
    pool: PgPool,
}

impl PgMovieStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_related(&self, detail: MovieDetail) -> StoreResult<MovieDetail> {
        let id = detail.id;
        Ok(MovieDetail {
            genres: fetch_related(&self.pool, Related::Genres, id).await?,
            actors: fetch_related(&self.pool, Related::Actors, id).await?,
            languages: fetch_related(&self.pool, Related::Languages, id).await?,
            ..detail
        })
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn count_movies(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_movies(&self, offset: i64, limit: i64) -> StoreResult<Vec<MovieSummary>> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM movies ORDER BY id DESC OFFSET $1 LIMIT $2"
        );
        let rows = sqlx::query_as::<_, SummaryRow>(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(summary_from_row).collect())
    }

    async fn movie_exists(&self, name: &str, date: NaiveDate) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM movies WHERE name = $1 AND date = $2)",
        )
        .bind(name)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_movie(&self, movie: NewMovie) -> StoreResult<MovieDetail> {
        let mut tx = self.pool.begin().await?;

        let country_id: i64 = sqlx::query_scalar(
            "INSERT INTO countries (code) VALUES ($1) \
             ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code \
             RETURNING id",
        )
        .bind(&movie.country)
        .fetch_one(&mut *tx)
        .await?;

        let movie_id: i64 = sqlx::query_scalar(
            "INSERT INTO movies \
                (name, date, score, overview, status, budget, revenue, country_id) \
             VALUES ($1, $2, $3, $4, $5::movie_status, $6::numeric, $7, $8) \
             RETURNING id",
        )
        .bind(&movie.name)
        .bind(movie.date)
        .bind(movie.score)
        .bind(&movie.overview)
        .bind(movie.status.as_str())
        .bind(movie.budget)
        .bind(movie.revenue)
        .bind(country_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_or_db(e, &format!("movie '{}' ({})", movie.name, movie.date)))?;

        link_related(&mut tx, Related::Genres, movie_id, &movie.genres).await?;
        link_related(&mut tx, Related::Actors, movie_id, &movie.actors).await?;
        link_related(&mut tx, Related::Languages, movie_id, &movie.languages).await?;

        let detail = fetch_detail(&mut *tx, movie_id)
            .await?
            .ok_or_else(|| decode_error(format!("movie {movie_id} vanished after insert")))?;
        tx.commit().await?;

        self.with_related(detail).await
    }

    async fn find_movie(&self, movie_id: i64) -> StoreResult<Option<MovieDetail>> {
        match fetch_detail(&self.pool, movie_id).await? {
            Some(detail) => Ok(Some(self.with_related(detail).await?)),
            None => Ok(None),
        }
    }

    async fn delete_movie(&self, movie_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_movie(&self, movie_id: i64, changes: MovieChanges) -> StoreResult<bool> {
        if changes.is_empty() {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM movies WHERE id = $1)",
            )
            .bind(movie_id)
            .fetch_one(&self.pool)
            .await?;
            return Ok(exists);
        }

        let result = sqlx::query(
            "UPDATE movies SET \
                name = COALESCE($1, name), \
                date = COALESCE($2, date), \
                score = COALESCE($3, score), \
                overview = COALESCE($4, overview), \
                status = COALESCE($5::movie_status, status), \
                budget = COALESCE($6::numeric, budget), \
                revenue = COALESCE($7, revenue) \
             WHERE id = $8",
        )
        .bind(changes.name)
        .bind(changes.date)
        .bind(changes.score)
        .bind(changes.overview)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.budget)
        .bind(changes.revenue)
        .bind(movie_id)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or_db(e, &format!("movie {movie_id}")))?;
        Ok(result.rows_affected() > 0)
    }
}
