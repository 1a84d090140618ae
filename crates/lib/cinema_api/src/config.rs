//! API server configuration.

use std::str::FromStr;

use chrono::Duration;
use cinema_core::accounts::session::DEFAULT_LOGIN_TIME_DAYS;
use cinema_core::auth::jwt::{DEFAULT_ALGORITHM, JwtSettings, resolve_secret};
use cinema_core::notifications::smtp::EmailConfig;
use cinema_core::storage::s3::S3Config;
use tracing::warn;
use url::Url;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/cinema";
const DEFAULT_APP_BASE_URL: &str = "http://127.0.0.1:8000/";

/// Longest accepted `LOGIN_TIME_DAYS`.
pub const MAX_LOGIN_TIME_DAYS: i64 = 365;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    pub jwt: JwtSettings,
    /// How long a login stays refreshable. Also the JWT refresh lifetime.
    pub login_time_days: i64,
    /// Base for links sent in emails. Always ends with `/`.
    pub app_base_url: String,
    pub email: EmailConfig,
    pub s3: S3Config,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                 | Default                              |
    /// |--------------------------|--------------------------------------|
    /// | `BIND_ADDR`              | `127.0.0.1:8000`                     |
    /// | `DATABASE_URL`           | `postgres://localhost:5432/cinema`   |
    /// | `SECRET_KEY_ACCESS`      | generated & persisted to file        |
    /// | `SECRET_KEY_REFRESH`     | generated & persisted to file        |
    /// | `JWT_SIGNING_ALGORITHM`  | `HS256`                              |
    /// | `LOGIN_TIME_DAYS`        | `7` (1 to 365)                       |
    /// | `APP_BASE_URL`           | `http://127.0.0.1:8000/`             |
    /// | `EMAIL_HOST`             | `localhost`                          |
    /// | `EMAIL_PORT`             | `25`                                 |
    /// | `EMAIL_HOST_USER`        | `noreply@cinema.local`               |
    /// | `EMAIL_HOST_PASSWORD`    | empty                                |
    /// | `EMAIL_USE_TLS`          | `false`                              |
    /// | `S3_STORAGE_ENDPOINT`    | `http://localhost:9000`              |
    /// | `S3_STORAGE_ACCESS_KEY`  | empty                                |
    /// | `S3_STORAGE_SECRET_KEY`  | empty                                |
    /// | `S3_BUCKET_NAME`         | `cinema-storage`                     |
    /// | `S3_REGION`              | `us-east-1`                          |
    pub fn from_env() -> Self {
        let mut jwt = JwtSettings::new(
            resolve_secret("SECRET_KEY_ACCESS", "access_secret"),
            resolve_secret("SECRET_KEY_REFRESH", "refresh_secret"),
        );
        jwt.algorithm = env_or("JWT_SIGNING_ALGORITHM", DEFAULT_ALGORITHM);
        let login_time_days =
            bounded_login_time_days(env_parse("LOGIN_TIME_DAYS", DEFAULT_LOGIN_TIME_DAYS));
        jwt.refresh_ttl = Duration::days(login_time_days);

        let s3_defaults = S3Config::default();

        Self {
            bind_addr: env_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            jwt,
            login_time_days,
            app_base_url: base_url(&env_or("APP_BASE_URL", DEFAULT_APP_BASE_URL)),
            email: EmailConfig {
                host: env_or("EMAIL_HOST", "localhost"),
                port: env_parse("EMAIL_PORT", 25),
                user: env_or("EMAIL_HOST_USER", "noreply@cinema.local"),
                password: env_or("EMAIL_HOST_PASSWORD", ""),
                use_tls: env_parse("EMAIL_USE_TLS", false),
            },
            s3: S3Config {
                endpoint: env_or("S3_STORAGE_ENDPOINT", &s3_defaults.endpoint),
                access_key: env_or("S3_STORAGE_ACCESS_KEY", ""),
                secret_key: env_or("S3_STORAGE_SECRET_KEY", ""),
                bucket: env_or("S3_BUCKET_NAME", &s3_defaults.bucket),
                region: env_or("S3_REGION", &s3_defaults.region),
            },
        }
    }

    /// Configuration for in-process use: fixed secrets, local defaults.
    pub fn local(mut jwt: JwtSettings) -> Self {
        jwt.refresh_ttl = Duration::days(DEFAULT_LOGIN_TIME_DAYS);
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            jwt,
            login_time_days: DEFAULT_LOGIN_TIME_DAYS,
            app_base_url: base_url(DEFAULT_APP_BASE_URL),
            email: EmailConfig {
                host: "localhost".into(),
                port: 25,
                user: "noreply@cinema.local".into(),
                password: String::new(),
                use_tls: false,
            },
            s3: S3Config::default(),
        }
    }

    /// Absolute link under [`ApiConfig::app_base_url`] with query parameters.
    pub fn link(&self, path: &str, query: &[(&str, &str)]) -> String {
        let raw = format!("{}{}", self.app_base_url, path.trim_start_matches('/'));
        match Url::parse(&raw) {
            Ok(mut url) => {
                if !query.is_empty() {
                    url.query_pairs_mut().extend_pairs(query);
                }
                url.to_string()
            }
            Err(_) => raw,
        }
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(var: &str, default: T) -> T {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var, value = %raw, "Ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

fn bounded_login_time_days(days: i64) -> i64 {
    if (1..=MAX_LOGIN_TIME_DAYS).contains(&days) {
        days
    } else {
        warn!(
            days,
            max = MAX_LOGIN_TIME_DAYS,
            "LOGIN_TIME_DAYS out of range, using default"
        );
        DEFAULT_LOGIN_TIME_DAYS
    }
}

fn base_url(raw: &str) -> String {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    match Url::parse(&with_slash) {
        Ok(_) => with_slash,
        Err(e) => {
            warn!(value = raw, error = %e, "Invalid APP_BASE_URL, using default");
            DEFAULT_APP_BASE_URL.to_string()
        }
    }
}
