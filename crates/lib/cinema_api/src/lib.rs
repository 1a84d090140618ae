//! # cinema_api
//!
//! HTTP API library for Cinema accounts, profiles and the movie catalog.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use cinema_core::accounts::recovery::RecoveryTokens;
use cinema_core::accounts::session::SessionManager;
use cinema_core::accounts::store::AccountStore;
use cinema_core::accounts::users::Users;
use cinema_core::auth::AuthError;
use cinema_core::auth::jwt::JwtManager;
use cinema_core::movies::catalog::Catalog;
use cinema_core::movies::store::MovieStore;
use cinema_core::notifications::EmailSender;
use cinema_core::storage::FileStorage;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{accounts, movies, profiles};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    pub jwt: Arc<JwtManager>,
    pub users: Users,
    pub recovery: RecoveryTokens,
    pub sessions: SessionManager,
    pub catalog: Catalog,
    /// Direct store access for profile records.
    pub store: Arc<dyn AccountStore>,
    pub mailer: Arc<dyn EmailSender>,
    pub storage: Arc<dyn FileStorage>,
}

impl AppState {
    /// Wire the account components over `store` and the catalog over
    /// `movies`.
    ///
    /// Fails when the configured signing algorithm is not supported.
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn AccountStore>,
        movies: Arc<dyn MovieStore>,
        mailer: Arc<dyn EmailSender>,
        storage: Arc<dyn FileStorage>,
    ) -> Result<Self, AuthError> {
        let jwt = Arc::new(JwtManager::new(&config.jwt)?);
        let recovery = RecoveryTokens::new(store.clone());
        let users = Users::new(store.clone(), recovery.clone());
        let sessions = SessionManager::new(store.clone(), jwt.clone(), config.login_time_days);
        let catalog = Catalog::new(movies);

        Ok(Self {
            config,
            jwt,
            users,
            recovery,
            sessions,
            catalog,
            store,
            mailer,
            storage,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `cinema_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    cinema_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_ACCOUNTS_REGISTER, post(accounts::register_handler))
        .route(routes::POST_ACCOUNTS_ACTIVATE, post(accounts::activate_handler))
        .route(
            routes::POST_ACCOUNTS_PASSWORD_RESET_REQUEST,
            post(accounts::password_reset_request_handler),
        )
        .route(
            routes::POST_ACCOUNTS_RESET_PASSWORD_COMPLETE,
            post(accounts::password_reset_complete_handler),
        )
        .route(routes::POST_ACCOUNTS_LOGIN, post(accounts::login_handler))
        .route(routes::POST_ACCOUNTS_REFRESH, post(accounts::refresh_handler))
        .route(routes::POST_ACCOUNTS_LOGOUT, post(accounts::logout_handler))
        .route(
            routes::THEATER_MOVIES,
            get(movies::list_movies_handler).post(movies::create_movie_handler),
        )
        .route(
            routes::THEATER_MOVIE,
            get(movies::get_movie_handler)
                .patch(movies::update_movie_handler)
                .delete(movies::delete_movie_handler),
        );

    // Protected routes (require a bearer access token)
    let protected = Router::new()
        .route(
            routes::POST_PROFILES_USER_PROFILE,
            post(profiles::create_profile_handler)
                .layer(DefaultBodyLimit::max(services::profiles::PROFILE_BODY_LIMIT)),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
