//! Account domain models.
//!
//! Internal records as read from storage. Password hashes never leave this
//! layer; the API builds its own response types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User group: matches the `user_group` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserGroup {
    User,
    Moderator,
    Admin,
}

impl UserGroup {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserGroup::User => "user",
            UserGroup::Moderator => "moderator",
            UserGroup::Admin => "admin",
        }
    }

    /// Whether members may manage other users' data.
    pub fn is_staff(&self) -> bool {
        !matches!(self, UserGroup::User)
    }
}

impl FromStr for UserGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserGroup::User),
            "moderator" => Ok(UserGroup::Moderator),
            "admin" => Ok(UserGroup::Admin),
            other => Err(format!("unknown user group '{other}'")),
        }
    }
}

impl fmt::Display for UserGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub group: UserGroup,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub group: UserGroup,
}

/// The two kinds of single-use account recovery tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryKind {
    Activation,
    PasswordReset,
}

impl RecoveryKind {
    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            RecoveryKind::Activation => "activation_tokens",
            RecoveryKind::PasswordReset => "password_reset_tokens",
        }
    }
}

impl fmt::Display for RecoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryKind::Activation => f.write_str("activation"),
            RecoveryKind::PasswordReset => f.write_str("password-reset"),
        }
    }
}

/// Stored activation or password-reset token.
#[derive(Debug, Clone)]
pub struct RecoveryToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RecoveryToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Input for storing a recovery token.
#[derive(Debug, Clone)]
pub struct NewRecoveryToken {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Refresh token record stored in the database.
///
/// `token` is the encoded signed token itself.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
