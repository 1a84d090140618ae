//! In-memory account store for tests that run without PostgreSQL.
//!
//! A single async mutex guards all tables, so each operation is atomic the
//! same way a committed transaction is.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::store::{AccountStore, StoreError, StoreResult};
use crate::models::accounts::{
    NewRecoveryToken, NewUser, RecoveryKind, RecoveryToken, RefreshTokenRecord, User,
};
use crate::models::profiles::{NewProfile, UserProfile};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    activation_tokens: Vec<RecoveryToken>,
    password_reset_tokens: Vec<RecoveryToken>,
    refresh_tokens: Vec<RefreshTokenRecord>,
    profiles: Vec<UserProfile>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn tokens(&self, kind: RecoveryKind) -> &Vec<RecoveryToken> {
        match kind {
            RecoveryKind::Activation => &self.activation_tokens,
            RecoveryKind::PasswordReset => &self.password_reset_tokens,
        }
    }

    fn tokens_mut(&mut self, kind: RecoveryKind) -> &mut Vec<RecoveryToken> {
        match kind {
            RecoveryKind::Activation => &mut self.activation_tokens,
            RecoveryKind::PasswordReset => &mut self.password_reset_tokens,
        }
    }

    fn push_token(
        &mut self,
        kind: RecoveryKind,
        user_id: i64,
        token: NewRecoveryToken,
    ) -> RecoveryToken {
        let record = RecoveryToken {
            id: self.next_id(),
            user_id,
            token: token.token,
            created_at: token.created_at,
            expires_at: token.expires_at,
        };
        self.tokens_mut(kind).push(record.clone());
        record
    }

    fn take_token(&mut self, kind: RecoveryKind, user_id: i64, token_id: i64) -> bool {
        let tokens = self.tokens_mut(kind);
        let before = tokens.len();
        tokens.retain(|t| !(t.id == token_id && t.user_id == user_id));
        tokens.len() != before
    }

    fn user_mut(&mut self, user_id: i64) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }
}

/// [`AccountStore`] kept entirely in process memory.
#[derive(Default)]
pub struct MemoryAccountStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }

    /// Overwrite a token's expiry, e.g. to simulate the passage of time.
    pub async fn set_recovery_token_expiry(
        &self,
        kind: RecoveryKind,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) {
        let mut tables = self.tables.lock().await;
        for token in tables
            .tokens_mut(kind)
            .iter_mut()
            .filter(|t| t.user_id == user_id)
        {
            token.expires_at = expires_at;
        }
    }

    /// Number of stored tokens of `kind` for the user.
    pub async fn recovery_token_count(&self, kind: RecoveryKind, user_id: i64) -> usize {
        let tables = self.tables.lock().await;
        tables
            .tokens(kind)
            .iter()
            .filter(|t| t.user_id == user_id)
            .count()
    }

    /// Number of persisted refresh tokens for the user.
    pub async fn refresh_token_count(&self, user_id: i64) -> usize {
        let tables = self.tables.lock().await;
        tables
            .refresh_tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .count()
    }

    /// Remove a user and everything it owns.
    pub async fn delete_user(&self, user_id: i64) {
        let mut tables = self.tables.lock().await;
        tables.users.retain(|u| u.id != user_id);
        tables.activation_tokens.retain(|t| t.user_id != user_id);
        tables.password_reset_tokens.retain(|t| t.user_id != user_id);
        tables.refresh_tokens.retain(|t| t.user_id != user_id);
        tables.profiles.retain(|p| p.user_id != user_id);
    }

    /// Insert a user directly, bypassing registration.
    pub async fn insert_user(&self, user: NewUser, is_active: bool) -> User {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let created = User {
            id: tables.next_id(),
            email: user.email,
            hashed_password: user.hashed_password,
            is_active,
            group: user.group,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        created
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn create_user_with_activation(
        &self,
        user: NewUser,
        token: NewRecoveryToken,
    ) -> StoreResult<(User, RecoveryToken)> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(user.email));
        }

        let now = Utc::now();
        let created = User {
            id: tables.next_id(),
            email: user.email,
            hashed_password: user.hashed_password,
            is_active: false,
            group: user.group,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        let activation = tables.push_token(RecoveryKind::Activation, created.id, token);
        Ok((created, activation))
    }

    async fn replace_recovery_token(
        &self,
        kind: RecoveryKind,
        user_id: i64,
        token: NewRecoveryToken,
    ) -> StoreResult<RecoveryToken> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        tables.tokens_mut(kind).retain(|t| t.user_id != user_id);
        Ok(tables.push_token(kind, user_id, token))
    }

    async fn find_recovery_token(
        &self,
        kind: RecoveryKind,
        user_id: i64,
    ) -> StoreResult<Option<RecoveryToken>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .tokens(kind)
            .iter()
            .filter(|t| t.user_id == user_id)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn find_recovery_token_by_email(
        &self,
        kind: RecoveryKind,
        email: &str,
        token: &str,
    ) -> StoreResult<Option<(RecoveryToken, User)>> {
        let tables = self.tables.lock().await;
        let Some(user) = tables.users.iter().find(|u| u.email == email) else {
            return Ok(None);
        };
        Ok(tables
            .tokens(kind)
            .iter()
            .find(|t| t.user_id == user.id && t.token == token)
            .map(|t| (t.clone(), user.clone())))
    }

    async fn delete_recovery_token(&self, kind: RecoveryKind, token_id: i64) -> StoreResult<bool> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        let tokens = tables.tokens_mut(kind);
        let before = tokens.len();
        tokens.retain(|t| t.id != token_id);
        Ok(tokens.len() != before)
    }

    async fn activate_user(&self, user_id: i64, token_id: i64) -> StoreResult<bool> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        if !tables.take_token(RecoveryKind::Activation, user_id, token_id) {
            return Ok(false);
        }
        if let Some(user) = tables.user_mut(user_id) {
            user.is_active = true;
            user.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn reset_password(
        &self,
        user_id: i64,
        hashed_password: &str,
        token_id: i64,
    ) -> StoreResult<bool> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        if !tables.take_token(RecoveryKind::PasswordReset, user_id, token_id) {
            return Ok(false);
        }
        if let Some(user) = tables.user_mut(user_id) {
            user.hashed_password = hashed_password.to_string();
            user.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn store_refresh_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        let record = RefreshTokenRecord {
            id: tables.next_id(),
            user_id,
            token: token.to_string(),
            created_at: Utc::now(),
            expires_at,
        };
        tables.refresh_tokens.push(record.clone());
        Ok(record)
    }

    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .refresh_tokens
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn delete_refresh_token(&self, token: &str) -> StoreResult<u64> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|t| t.token != token);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }

    async fn find_profile_by_user(&self, user_id: i64) -> StoreResult<Option<UserProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn create_profile(&self, profile: NewProfile) -> StoreResult<UserProfile> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        if tables.profiles.iter().any(|p| p.user_id == profile.user_id) {
            return Err(StoreError::Duplicate(format!(
                "profile for user {}",
                profile.user_id
            )));
        }
        let created = UserProfile {
            id: tables.next_id(),
            user_id: profile.user_id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            gender: profile.gender,
            date_of_birth: profile.date_of_birth,
            info: profile.info,
            avatar: profile.avatar,
        };
        tables.profiles.push(created.clone());
        Ok(created)
    }
}
