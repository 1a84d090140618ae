//! Session token lifecycle.
//!
//! Login mints a refresh token, persists it, and then mints an access token.
//! Access tokens are never persisted. A refresh token is only honoured while
//! its signature is valid, it has not expired, and its exact string is still
//! stored. Revocation deletes the stored string.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use super::AccountError;
use super::store::AccountStore;
use crate::auth::TokenError;
use crate::auth::jwt::{JwtManager, UserClaims};
use crate::auth::password::verify_password;

/// Default number of days a login stays refreshable.
pub const DEFAULT_LOGIN_TIME_DAYS: i64 = 7;

/// Tokens returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues, refreshes and revokes session tokens.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AccountStore>,
    jwt: Arc<JwtManager>,
    login_time: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn AccountStore>, jwt: Arc<JwtManager>, login_time_days: i64) -> Self {
        Self {
            store,
            jwt,
            login_time: Duration::try_days(login_time_days).unwrap_or(Duration::MAX),
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// Authenticate by email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AccountError> {
        let user = match self.store.find_user_by_email(email).await? {
            Some(user) if verify_password(password, &user.hashed_password)? => user,
            _ => {
                debug!("Rejected login credentials");
                return Err(AccountError::Unauthorized(
                    "Invalid email or password.".into(),
                ));
            }
        };
        if !user.is_active {
            return Err(AccountError::Forbidden(
                "User account is not activated.".into(),
            ));
        }

        let claims = UserClaims { user_id: user.id };
        let refresh_token = self
            .jwt
            .create_refresh_token(&claims, Some(self.login_time))?;
        let expires_at = Utc::now()
            .checked_add_signed(self.login_time)
            .ok_or_else(|| TokenError::Encoding("login time is out of range".into()))?;
        self.store
            .store_refresh_token(user.id, &refresh_token, expires_at)
            .await?;

        let access_token = self.jwt.create_access_token(&claims, None)?;
        info!(user_id = user.id, "User logged in");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a persisted refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AccountError> {
        let claims = self.jwt.decode_refresh_token::<UserClaims>(refresh_token)?;

        let Some(record) = self.store.find_refresh_token(refresh_token).await? else {
            warn!(user_id = claims.data.user_id, "Refresh token not persisted");
            return Err(AccountError::Unauthorized(
                "Refresh token not found.".into(),
            ));
        };
        if record.is_expired(Utc::now()) {
            return Err(TokenError::Expired.into());
        }

        if self
            .store
            .find_user_by_id(claims.data.user_id)
            .await?
            .is_none()
        {
            return Err(AccountError::NotFound("User not found.".into()));
        }

        let access_token = self.jwt.create_access_token(&claims.data, None)?;
        debug!(user_id = claims.data.user_id, "Refreshed access token");
        Ok(access_token)
    }

    /// Delete a persisted refresh token. Unknown tokens are ignored.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AccountError> {
        let removed = self.store.delete_refresh_token(refresh_token).await?;
        if removed > 0 {
            info!(removed, "Revoked refresh token");
        }
        Ok(())
    }
}
