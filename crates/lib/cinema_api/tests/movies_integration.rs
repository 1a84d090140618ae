//! Movie catalog endpoints driven through the router against the in-memory store.

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestApp, spawn_app};

const MOVIES: &str = "/api/v1/theater/movies/";

fn movie_uri(movie_id: i64) -> String {
    format!("/api/v1/theater/movies/{movie_id}/")
}

fn movie_body(name: &str) -> Value {
    json!({
        "name": name,
        "date": "2025-01-01",
        "score": 85.5,
        "overview": "An amazing movie.",
        "status": "Released",
        "budget": 1000000.00,
        "revenue": 5000000.00,
        "country": "US",
        "genres": ["Action", "Adventure"],
        "actors": ["John Doe", "Jane Doe"],
        "languages": ["English", "French"]
    })
}

async fn create(app: &TestApp, name: &str) -> i64 {
    let (status, body) = app.post_json(MOVIES, movie_body(name)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn seed(app: &TestApp, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        ids.push(create(app, &format!("Movie {i}")).await);
    }
    ids
}

#[tokio::test]
async fn empty_catalog_is_not_found() {
    let app = spawn_app();
    let (status, body) = app.get(MOVIES).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No movies found.");
}

#[tokio::test]
async fn default_page_lists_ten_newest() {
    let app = spawn_app();
    let ids = seed(&app, 12).await;

    let (status, body) = app.get(MOVIES).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 10);
    assert_eq!(movies[0]["id"], *ids.last().unwrap());
    let listed: Vec<i64> = movies.iter().map(|m| m["id"].as_i64().unwrap()).collect();
    assert!(listed.windows(2).all(|w| w[0] > w[1]));

    assert_eq!(body["total_items"], 12);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["prev_page"], Value::Null);
    assert_eq!(body["next_page"], "/theater/movies/?page=2&per_page=10");

    let first = &movies[0];
    for field in ["id", "name", "date", "score", "overview"] {
        assert!(first.get(field).is_some(), "missing {field}");
    }
    assert!(first.get("genres").is_none());
}

#[tokio::test]
async fn custom_page_links_both_ways() {
    let app = spawn_app();
    seed(&app, 12).await;

    let (status, body) = app.get(&format!("{MOVIES}?page=2&per_page=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movies"].as_array().unwrap().len(), 5);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["prev_page"], "/theater/movies/?page=1&per_page=5");
    assert_eq!(body["next_page"], "/theater/movies/?page=3&per_page=5");

    let (status, body) = app.get(&format!("{MOVIES}?page=3&per_page=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movies"].as_array().unwrap().len(), 2);
    assert_eq!(body["next_page"], Value::Null);

    let (status, body) = app.get(&format!("{MOVIES}?page=4&per_page=5")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No movies found.");

    let (status, _) = app.get(&format!("{MOVIES}?per_page=20")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_pagination_is_unprocessable() {
    let app = spawn_app();
    seed(&app, 1).await;

    for query in [
        "page=0&per_page=10",
        "page=1&per_page=0",
        "page=0&per_page=0",
        "per_page=21",
        "page=abc",
    ] {
        let (status, _) = app.get(&format!("{MOVIES}?{query}")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{query}");
    }
}

#[tokio::test]
async fn create_links_related_entities() {
    let app = spawn_app();

    let body = json!({
        "name": "New Movie",
        "date": "2025-01-01",
        "score": 85.5,
        "overview": "An amazing movie.",
        "status": "Post Production",
        "budget": 1000000.00,
        "revenue": 5000000.00,
        "country": "us",
        "genres": ["science fiction", "Action"],
        "actors": ["john doe"],
        "languages": ["english"]
    });
    let (status, created) = app.post_json(MOVIES, body).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["name"], "New Movie");
    assert_eq!(created["date"], "2025-01-01");
    assert_eq!(created["score"], 85.5);
    assert_eq!(created["status"], "Post Production");
    assert_eq!(created["budget"], 1000000.0);
    assert_eq!(created["country"]["code"], "US");
    assert_eq!(created["country"]["name"], Value::Null);
    assert_eq!(created["genres"][0]["name"], "Action");
    assert_eq!(created["genres"][1]["name"], "Science Fiction");
    assert_eq!(created["actors"][0]["name"], "John Doe");
    assert_eq!(created["languages"][0]["name"], "English");

    let genres: Vec<String> = app.movies.genres().await.into_iter().map(|g| g.name).collect();
    assert_eq!(genres, ["Science Fiction", "Action"]);
    assert_eq!(app.movies.countries().await.len(), 1);

    create(&app, "Sequel").await;
    assert_eq!(app.movies.genres().await.len(), 3);
    assert_eq!(app.movies.actors().await.len(), 2);
    assert_eq!(app.movies.languages().await.len(), 2);
    assert_eq!(app.movies.countries().await.len(), 1);
}

#[tokio::test]
async fn duplicate_movie_conflicts() {
    let app = spawn_app();
    create(&app, "Heat").await;

    let (status, body) = app.post_json(MOVIES, movie_body("Heat")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "A movie with the name 'Heat' and release date '2025-01-01' already exists."
    );
}

#[tokio::test]
async fn invalid_create_bodies_are_unprocessable() {
    let app = spawn_app();

    let mut far_future = movie_body("Later");
    far_future["date"] = json!("2999-01-01");
    let mut bad_score = movie_body("Scored");
    bad_score["score"] = json!(120);
    let mut negative_budget = movie_body("Cheap");
    negative_budget["budget"] = json!(-1);
    let mut bad_status = movie_body("Cancelled");
    bad_status["status"] = json!("Cancelled");
    let mut long_country = movie_body("Abroad");
    long_country["country"] = json!("USAX");

    for body in [far_future, bad_score, negative_budget, bad_status, long_country] {
        let (status, resp) = app.post_json(MOVIES, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{resp}");
    }
    assert_eq!(app.get(MOVIES).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_returns_details_or_not_found() {
    let app = spawn_app();
    let id = create(&app, "Detailed").await;

    let (status, body) = app.get(&movie_uri(id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["revenue"], 5000000.0);
    assert_eq!(body["actors"].as_array().unwrap().len(), 2);

    let (status, body) = app.get(&movie_uri(9_999)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Movie with the given ID was not found.");
}

#[tokio::test]
async fn delete_removes_the_movie() {
    let app = spawn_app();
    let id = create(&app, "Doomed").await;

    let (status, body) = app.send_empty("DELETE", &movie_uri(id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert_eq!(app.get(&movie_uri(id)).await.0, StatusCode::NOT_FOUND);

    let (status, body) = app.send_empty("DELETE", &movie_uri(id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Movie with the given ID was not found.");
}

#[tokio::test]
async fn patch_updates_only_given_fields() {
    let app = spawn_app();
    let id = create(&app, "Draft").await;

    let (status, body) = app
        .send_json(
            "PATCH",
            &movie_uri(id),
            json!({ "name": "Final Cut", "score": 92.0, "status": "In Production" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Movie updated successfully.");

    let (_, movie) = app.get(&movie_uri(id)).await;
    assert_eq!(movie["name"], "Final Cut");
    assert_eq!(movie["score"], 92.0);
    assert_eq!(movie["status"], "In Production");
    assert_eq!(movie["overview"], "An amazing movie.");
    assert_eq!(movie["genres"].as_array().unwrap().len(), 2);

    let (status, _) = app.send_json("PATCH", &movie_uri(id), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send_json("PATCH", &movie_uri(id), json!({ "revenue": -5 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn patch_missing_movie_is_not_found() {
    let app = spawn_app();
    let (status, body) = app
        .send_json("PATCH", &movie_uri(9_999), json!({ "score": 10 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Movie with the given ID was not found.");
}

#[tokio::test]
async fn patch_onto_existing_name_and_date_is_invalid_input() {
    let app = spawn_app();
    create(&app, "Original").await;
    let copy = create(&app, "Copy").await;

    let (status, body) = app
        .send_json("PATCH", &movie_uri(copy), json!({ "name": "Original" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid input data.");
}

#[tokio::test]
async fn storage_failure_is_internal_error() {
    let app = spawn_app();
    app.movies.set_fail_writes(true);

    let (status, body) = app.post_json(MOVIES, movie_body("Offline")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
}
