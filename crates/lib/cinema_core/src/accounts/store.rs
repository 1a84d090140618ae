//! Storage seam for accounts, recovery tokens, refresh tokens and profiles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::accounts::{
    NewRecoveryToken, NewUser, RecoveryKind, RecoveryToken, RefreshTokenRecord, User,
};
use crate::models::profiles::{NewProfile, UserProfile};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations used by the account components.
///
/// Every method that writes more than one row runs in a single transaction:
/// either all of its effects are committed or none are.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, user_id: i64) -> StoreResult<Option<User>>;

    /// Insert a user together with its activation token.
    ///
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn create_user_with_activation(
        &self,
        user: NewUser,
        token: NewRecoveryToken,
    ) -> StoreResult<(User, RecoveryToken)>;

    /// Delete every token of `kind` for the user, then insert `token`.
    async fn replace_recovery_token(
        &self,
        kind: RecoveryKind,
        user_id: i64,
        token: NewRecoveryToken,
    ) -> StoreResult<RecoveryToken>;

    /// The user's token of `kind`, if any.
    async fn find_recovery_token(
        &self,
        kind: RecoveryKind,
        user_id: i64,
    ) -> StoreResult<Option<RecoveryToken>>;

    /// Joined lookup of a token of `kind` by owner email and token value.
    async fn find_recovery_token_by_email(
        &self,
        kind: RecoveryKind,
        email: &str,
        token: &str,
    ) -> StoreResult<Option<(RecoveryToken, User)>>;

    /// Delete a token by id. Returns whether a row was removed.
    async fn delete_recovery_token(&self, kind: RecoveryKind, token_id: i64) -> StoreResult<bool>;

    /// Consume an activation token and mark its user active.
    ///
    /// Returns `false`, leaving the user untouched, when the token row was
    /// already gone.
    async fn activate_user(&self, user_id: i64, token_id: i64) -> StoreResult<bool>;

    /// Consume a password-reset token and overwrite the user's password hash.
    ///
    /// Returns `false`, leaving the password untouched, when the token row was
    /// already gone.
    async fn reset_password(
        &self,
        user_id: i64,
        hashed_password: &str,
        token_id: i64,
    ) -> StoreResult<bool>;

    async fn store_refresh_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord>;

    /// Exact-match lookup by encoded token.
    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshTokenRecord>>;

    /// Delete persisted refresh tokens matching `token`. Returns rows removed.
    async fn delete_refresh_token(&self, token: &str) -> StoreResult<u64>;

    async fn find_profile_by_user(&self, user_id: i64) -> StoreResult<Option<UserProfile>>;

    /// Fails with [`StoreError::Duplicate`] when the user already has a profile.
    async fn create_profile(&self, profile: NewProfile) -> StoreResult<UserProfile>;
}
