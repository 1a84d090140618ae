//! JWT token generation and verification.
//!
//! Access and refresh tokens are signed with independent secrets so that a
//! leaked refresh secret cannot forge access tokens and vice versa. Both use
//! the same configured HMAC algorithm.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{AuthError, TokenError};

/// Default access token lifetime: 60 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 60;

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Default signing algorithm.
pub const DEFAULT_ALGORITHM: &str = "HS256";

/// Immutable signing configuration.
#[derive(Clone, Debug)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Algorithm name, e.g. `HS256`.
    pub algorithm: String,
    pub access_ttl: Duration,
    /// Lifetime of refresh tokens minted without an explicit ttl.
    pub refresh_ttl: Duration,
}

impl JwtSettings {
    /// Settings with the default algorithm and lifetimes.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            algorithm: DEFAULT_ALGORITHM.to_string(),
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
        }
    }
}

/// Decoded token payload: the caller's claims plus the expiry.
///
/// The caller's claims must not contain an `exp` field of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims<T> {
    #[serde(flatten)]
    pub data: T,
    /// Expiry (unix timestamp, UTC).
    pub exp: i64,
}

/// Claims carried by session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub user_id: i64,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Mints and verifies access and refresh tokens.
pub struct JwtManager {
    access: KeyPair,
    refresh: KeyPair,
    algorithm: Algorithm,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtManager {
    /// Build a manager from settings. Only HMAC algorithms are accepted.
    pub fn new(settings: &JwtSettings) -> Result<Self, AuthError> {
        let algorithm = Algorithm::from_str(&settings.algorithm)
            .map_err(|_| AuthError::UnsupportedAlgorithm(settings.algorithm.clone()))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::UnsupportedAlgorithm(settings.algorithm.clone()));
        }

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(Self {
            access: KeyPair::from_secret(&settings.access_secret),
            refresh: KeyPair::from_secret(&settings.refresh_secret),
            algorithm,
            validation,
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
        })
    }

    /// Sign an access token expiring `ttl` from now (default 60 minutes).
    pub fn create_access_token<T: Serialize>(
        &self,
        claims: &T,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.create_token(claims, &self.access, ttl.unwrap_or(self.access_ttl))
    }

    /// Sign a refresh token expiring `ttl` from now (default 7 days).
    pub fn create_refresh_token<T: Serialize>(
        &self,
        claims: &T,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.create_token(claims, &self.refresh, ttl.unwrap_or(self.refresh_ttl))
    }

    pub fn decode_access_token<T: DeserializeOwned>(
        &self,
        token: &str,
    ) -> Result<Claims<T>, TokenError> {
        self.decode_token(token, &self.access)
    }

    pub fn decode_refresh_token<T: DeserializeOwned>(
        &self,
        token: &str,
    ) -> Result<Claims<T>, TokenError> {
        self.decode_token(token, &self.refresh)
    }

    pub fn verify_access_token_or_raise(&self, token: &str) -> Result<(), TokenError> {
        self.decode_access_token::<serde_json::Map<String, serde_json::Value>>(token)
            .map(|_| ())
    }

    pub fn verify_refresh_token_or_raise(&self, token: &str) -> Result<(), TokenError> {
        self.decode_refresh_token::<serde_json::Map<String, serde_json::Value>>(token)
            .map(|_| ())
    }

    fn create_token<T: Serialize>(
        &self,
        data: &T,
        keys: &KeyPair,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let exp = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Encoding(format!("token lifetime {ttl} is out of range")))?;
        let claims = Claims {
            data,
            exp: exp.timestamp(),
        };
        encode(&Header::new(self.algorithm), &claims, &keys.encoding)
            .map_err(|e| TokenError::Encoding(format!("jwt encode: {e}")))
    }

    fn decode_token<T: DeserializeOwned>(
        &self,
        token: &str,
        keys: &KeyPair,
    ) -> Result<Claims<T>, TokenError> {
        decode::<Claims<T>>(token, &keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// Resolve a signing secret: env var `var` → persisted file `file_name` → generated.
///
/// A generated secret is written under the platform data directory so that
/// tokens survive restarts.
pub fn resolve_secret(var: &str, file_name: &str) -> String {
    if let Ok(secret) = std::env::var(var)
        && !secret.is_empty()
    {
        return secret;
    }
    load_or_generate_secret(var, &secret_path(file_name))
}

/// Read the secret persisted at `secret_path`, generating and writing one if absent.
fn load_or_generate_secret(var: &str, secret_path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(secret_path)
        && !existing.trim().is_empty()
    {
        return existing.trim().to_string();
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::write(secret_path, &secret) {
        Ok(()) => info!(var, path = %secret_path.display(), "generated new signing secret"),
        Err(e) => warn!(var, error = %e, "generated signing secret could not be persisted"),
    }
    secret
}

/// Path to a persisted secret file.
fn secret_path(file_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cinema")
        .join(file_name)
}
