//! Movie catalog models.
//!
//! Unlike account records these carry nothing private, so they serialize
//! straight into API responses.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Production status: matches the `movie_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovieStatus {
    Released,
    #[serde(rename = "Post Production")]
    PostProduction,
    #[serde(rename = "In Production")]
    InProduction,
}

impl MovieStatus {
    pub const ALL: [MovieStatus; 3] = [
        MovieStatus::Released,
        MovieStatus::PostProduction,
        MovieStatus::InProduction,
    ];

    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieStatus::Released => "Released",
            MovieStatus::PostProduction => "Post Production",
            MovieStatus::InProduction => "In Production",
        }
    }
}

impl FromStr for MovieStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovieStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown movie status '{s}'"))
    }
}

impl fmt::Display for MovieStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Production country, keyed by its code. `name` is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub code: String,
    pub name: Option<String>,
}

/// A row of one of the name-keyed lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub id: i64,
    pub name: String,
}

pub type Genre = NamedEntity;
pub type Actor = NamedEntity;
pub type Language = NamedEntity;

/// List item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub score: f64,
    pub overview: String,
}

/// A movie with its country, genres, actors and languages.
///
/// Related lists are ordered by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub score: f64,
    pub overview: String,
    pub status: MovieStatus,
    pub budget: f64,
    pub revenue: f64,
    pub country: Country,
    pub genres: Vec<Genre>,
    pub actors: Vec<Actor>,
    pub languages: Vec<Language>,
}

/// Input for creating a movie. Related entities are referenced by code or
/// name and created when missing.
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub name: String,
    pub date: NaiveDate,
    pub score: f64,
    pub overview: String,
    pub status: MovieStatus,
    pub budget: f64,
    pub revenue: f64,
    pub country: String,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub languages: Vec<String>,
}

/// Partial update of a movie's own columns.
#[derive(Debug, Clone, Default)]
pub struct MovieChanges {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub score: Option<f64>,
    pub overview: Option<String>,
    pub status: Option<MovieStatus>,
    pub budget: Option<f64>,
    pub revenue: Option<f64>,
}

impl MovieChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date.is_none()
            && self.score.is_none()
            && self.overview.is_none()
            && self.status.is_none()
            && self.budget.is_none()
            && self.revenue.is_none()
    }
}
