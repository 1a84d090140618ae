//! Cinema accounts API server binary.
//!
//! Reads its configuration from the environment (and `.env`), runs the
//! embedded migrations and serves the accounts, profiles and movie catalog
//! API.

use std::sync::Arc;

use cinema_api::AppState;
use cinema_api::config::ApiConfig;
use cinema_core::accounts::pg::PgAccountStore;
use cinema_core::movies::pg::PgMovieStore;
use cinema_core::notifications::smtp::SmtpEmailSender;
use cinema_core::storage::s3::S3FileStorage;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "cinema_api_server", about = "Cinema API server")]
struct Args {
    /// Port to listen on. Overrides the port of `BIND_ADDR`.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// PostgreSQL connection URL. Overrides `DATABASE_URL` from the config.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cinema_api=debug,cinema_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    if let Some(port) = args.port {
        let host = config
            .bind_addr
            .rsplit_once(':')
            .map_or("127.0.0.1", |(host, _)| host);
        config.bind_addr = format!("{host}:{port}");
    }

    info!(
        bind_addr = %config.bind_addr,
        max_connections = args.max_connections,
        "starting cinema_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    info!("running database migrations");
    cinema_api::migrate(&pool).await?;

    let store = Arc::new(PgAccountStore::new(pool.clone()));
    let movies = Arc::new(PgMovieStore::new(pool));
    let mailer = Arc::new(SmtpEmailSender::new(&config.email)?);
    let storage = Arc::new(S3FileStorage::new(config.s3.clone()).await);

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, store, movies, mailer, storage)?;
    let app = cinema_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
