//! Single-use account recovery tokens (activation, password reset).
//!
//! Tokens are opaque random strings stored next to their owner. Issuing a new
//! token replaces any previous token of the same kind, so at most one is live
//! per user. Expiry is evaluated when a token is redeemed.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::{RngCore, rng};
use tracing::{debug, info, warn};

use super::AccountError;
use super::store::AccountStore;
use crate::auth::password::hash_password;
use crate::models::accounts::{NewRecoveryToken, RecoveryKind, RecoveryToken, User};

/// Default lifetime of activation and password-reset tokens.
pub const DEFAULT_RECOVERY_TOKEN_TTL_HOURS: i64 = 24;

/// Random bytes per token before encoding.
const TOKEN_BYTES: usize = 32;

/// Generate a URL-safe token from 32 bytes of OS-seeded randomness.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Issues and redeems recovery tokens.
#[derive(Clone)]
pub struct RecoveryTokens {
    store: Arc<dyn AccountStore>,
    activation_ttl: Duration,
    reset_ttl: Duration,
}

impl RecoveryTokens {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self {
            store,
            activation_ttl: Duration::hours(DEFAULT_RECOVERY_TOKEN_TTL_HOURS),
            reset_ttl: Duration::hours(DEFAULT_RECOVERY_TOKEN_TTL_HOURS),
        }
    }

    pub fn with_ttls(mut self, activation_ttl: Duration, reset_ttl: Duration) -> Self {
        self.activation_ttl = activation_ttl;
        self.reset_ttl = reset_ttl;
        self
    }

    fn ttl(&self, kind: RecoveryKind) -> Duration {
        match kind {
            RecoveryKind::Activation => self.activation_ttl,
            RecoveryKind::PasswordReset => self.reset_ttl,
        }
    }

    /// A fresh, not yet persisted token of `kind`.
    pub fn new_token(&self, kind: RecoveryKind) -> NewRecoveryToken {
        let now = Utc::now();
        NewRecoveryToken {
            token: generate_secure_token(),
            created_at: now,
            expires_at: now + self.ttl(kind),
        }
    }

    /// Replace the user's token of `kind` with a fresh one.
    pub async fn issue(
        &self,
        kind: RecoveryKind,
        user_id: i64,
    ) -> Result<RecoveryToken, AccountError> {
        let token = self
            .store
            .replace_recovery_token(kind, user_id, self.new_token(kind))
            .await?;
        info!(user_id, %kind, "Issued recovery token");
        Ok(token)
    }

    /// Activate the account owning `(email, token)`.
    ///
    /// An expired token is deleted. A token whose user is already active is
    /// left in place and reported as [`AccountError::AlreadyActive`].
    pub async fn redeem_activation(&self, email: &str, token: &str) -> Result<User, AccountError> {
        let Some((record, mut user)) = self
            .store
            .find_recovery_token_by_email(RecoveryKind::Activation, email, token)
            .await?
        else {
            debug!("Activation token not found");
            return Err(AccountError::InvalidOrExpired);
        };

        if record.is_expired(Utc::now()) {
            self.store
                .delete_recovery_token(RecoveryKind::Activation, record.id)
                .await?;
            info!(user_id = user.id, "Deleted expired activation token");
            return Err(AccountError::InvalidOrExpired);
        }

        if user.is_active {
            return Err(AccountError::AlreadyActive);
        }

        // A concurrent redemption may have consumed the token first.
        if !self.store.activate_user(user.id, record.id).await? {
            return Err(AccountError::InvalidOrExpired);
        }

        user.is_active = true;
        info!(user_id = user.id, "Activated user account");
        Ok(user)
    }

    /// Set a new password for the account owning `(email, token)`.
    ///
    /// Any mismatch against an existing reset token consumes that token.
    pub async fn redeem_password_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<User, AccountError> {
        let user = match self.store.find_user_by_email(email).await? {
            Some(user) if user.is_active => user,
            _ => return Err(AccountError::InvalidOrExpired),
        };

        let Some(record) = self
            .store
            .find_recovery_token(RecoveryKind::PasswordReset, user.id)
            .await?
        else {
            return Err(AccountError::InvalidOrExpired);
        };

        if record.token != token || record.is_expired(Utc::now()) {
            self.store
                .delete_recovery_token(RecoveryKind::PasswordReset, record.id)
                .await?;
            warn!(user_id = user.id, "Rejected password reset token");
            return Err(AccountError::InvalidOrExpired);
        }

        let hashed = hash_password(new_password)?;
        if !self
            .store
            .reset_password(user.id, &hashed, record.id)
            .await?
        {
            return Err(AccountError::InvalidOrExpired);
        }

        info!(user_id = user.id, "Password reset");
        Ok(User {
            hashed_password: hashed,
            ..user
        })
    }
}
