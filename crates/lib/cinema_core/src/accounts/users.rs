//! User registration and lookup.

use std::sync::Arc;

use tracing::info;

use super::AccountError;
use super::recovery::RecoveryTokens;
use super::store::{AccountStore, StoreError};
use crate::auth::password::hash_password;
use crate::models::accounts::{NewUser, RecoveryKind, RecoveryToken, User, UserGroup};

/// Registers and looks up users.
#[derive(Clone)]
pub struct Users {
    store: Arc<dyn AccountStore>,
    tokens: RecoveryTokens,
}

impl Users {
    pub fn new(store: Arc<dyn AccountStore>, tokens: RecoveryTokens) -> Self {
        Self { store, tokens }
    }

    /// Create an inactive user in the default group together with its
    /// activation token.
    ///
    /// `email` is expected to be normalized already.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, RecoveryToken), AccountError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(duplicate(email));
        }

        let new_user = NewUser {
            email: email.to_string(),
            hashed_password: hash_password(password)?,
            group: UserGroup::User,
        };
        let activation = self.tokens.new_token(RecoveryKind::Activation);

        let (user, token) = self
            .store
            .create_user_with_activation(new_user, activation)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => duplicate(email),
                other => other.into(),
            })?;

        info!(user_id = user.id, "Registered user");
        Ok((user, token))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        Ok(self.store.find_user_by_email(email).await?)
    }

    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, AccountError> {
        Ok(self.store.find_user_by_id(user_id).await?)
    }
}

fn duplicate(email: &str) -> AccountError {
    AccountError::Conflict(format!("A user with this email {email} already exists."))
}
