//! PostgreSQL account store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::store::{AccountStore, StoreError, StoreResult};
use crate::models::accounts::{
    NewRecoveryToken, NewUser, RecoveryKind, RecoveryToken, RefreshTokenRecord, User,
};
use crate::models::profiles::{NewProfile, UserProfile};

const USER_COLUMNS: &str =
    "id, email, hashed_password, is_active, group_name::text, created_at, updated_at";

const TOKEN_COLUMNS: &str = "id, user_id, token, created_at, expires_at";

const PROFILE_COLUMNS: &str =
    "id, user_id, first_name, last_name, gender::text, date_of_birth, info, avatar";

type UserRow = (i64, String, String, bool, String, DateTime<Utc>, DateTime<Utc>);

type TokenRow = (i64, i64, String, DateTime<Utc>, DateTime<Utc>);

type ProfileRow = (i64, i64, String, String, String, NaiveDate, String, String);

fn user_from_row(row: UserRow) -> StoreResult<User> {
    let (id, email, hashed_password, is_active, group, created_at, updated_at) = row;
    Ok(User {
        id,
        email,
        hashed_password,
        is_active,
        group: group.parse().map_err(decode_error)?,
        created_at,
        updated_at,
    })
}

fn token_from_row(row: TokenRow) -> RecoveryToken {
    let (id, user_id, token, created_at, expires_at) = row;
    RecoveryToken {
        id,
        user_id,
        token,
        created_at,
        expires_at,
    }
}

fn refresh_from_row(row: TokenRow) -> RefreshTokenRecord {
    let (id, user_id, token, created_at, expires_at) = row;
    RefreshTokenRecord {
        id,
        user_id,
        token,
        created_at,
        expires_at,
    }
}

fn profile_from_row(row: ProfileRow) -> StoreResult<UserProfile> {
    let (id, user_id, first_name, last_name, gender, date_of_birth, info, avatar) = row;
    Ok(UserProfile {
        id,
        user_id,
        first_name,
        last_name,
        gender: gender.parse().map_err(decode_error)?,
        date_of_birth,
        info,
        avatar,
    })
}

pub(crate) fn decode_error(msg: String) -> StoreError {
    StoreError::Db(sqlx::Error::Decode(msg.into()))
}

/// Map unique violations to [`StoreError::Duplicate`].
pub(crate) fn duplicate_or_db(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        return StoreError::Duplicate(what.to_string());
    }
    StoreError::Db(e)
}

async fn insert_recovery_token(
    tx: &mut Transaction<'_, Postgres>,
    kind: RecoveryKind,
    user_id: i64,
    token: &NewRecoveryToken,
) -> StoreResult<RecoveryToken> {
    let sql = format!(
        "INSERT INTO {} (user_id, token, created_at, expires_at) \
         VALUES ($1, $2, $3, $4) RETURNING {TOKEN_COLUMNS}",
        kind.table()
    );
    let row = sqlx::query_as::<_, TokenRow>(&sql)
        .bind(user_id)
        .bind(&token.token)
        .bind(token.created_at)
        .bind(token.expires_at)
        .fetch_one(&mut **tx)
        .await?;
    Ok(token_from_row(row))
}

/// [`AccountStore`] backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(user_from_row).transpose()
    }

    async fn find_user_by_id(&self, user_id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(user_from_row).transpose()
    }

    async fn create_user_with_activation(
        &self,
        user: NewUser,
        token: NewRecoveryToken,
    ) -> StoreResult<(User, RecoveryToken)> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO users (email, hashed_password, group_name) \
             VALUES ($1, $2, $3::user_group) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.email)
            .bind(&user.hashed_password)
            .bind(user.group.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| duplicate_or_db(e, &user.email))?;
        let created = user_from_row(row)?;

        let activation =
            insert_recovery_token(&mut tx, RecoveryKind::Activation, created.id, &token).await?;

        tx.commit().await?;
        Ok((created, activation))
    }

    async fn replace_recovery_token(
        &self,
        kind: RecoveryKind,
        user_id: i64,
        token: NewRecoveryToken,
    ) -> StoreResult<RecoveryToken> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("DELETE FROM {} WHERE user_id = $1", kind.table());
        sqlx::query(&sql).bind(user_id).execute(&mut *tx).await?;

        let record = insert_recovery_token(&mut tx, kind, user_id, &token).await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn find_recovery_token(
        &self,
        kind: RecoveryKind,
        user_id: i64,
    ) -> StoreResult<Option<RecoveryToken>> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM {} WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT 1",
            kind.table()
        );
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(token_from_row))
    }

    async fn find_recovery_token_by_email(
        &self,
        kind: RecoveryKind,
        email: &str,
        token: &str,
    ) -> StoreResult<Option<(RecoveryToken, User)>> {
        let sql = format!(
            "SELECT t.id, t.user_id, t.token, t.created_at, t.expires_at, \
                    u.id, u.email, u.hashed_password, u.is_active, u.group_name::text, \
                    u.created_at, u.updated_at \
             FROM {} t \
             JOIN users u ON u.id = t.user_id \
             WHERE u.email = $1 AND t.token = $2 \
             LIMIT 1",
            kind.table()
        );
        #[allow(clippy::type_complexity)]
        let row = sqlx::query_as::<
            _,
            (
                i64,
                i64,
                String,
                DateTime<Utc>,
                DateTime<Utc>,
                i64,
                String,
                String,
                bool,
                String,
                DateTime<Utc>,
                DateTime<Utc>,
            ),
        >(&sql)
        .bind(email)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let record = token_from_row((r.0, r.1, r.2, r.3, r.4));
            let user = user_from_row((r.5, r.6, r.7, r.8, r.9, r.10, r.11))?;
            Ok((record, user))
        })
        .transpose()
    }

    async fn delete_recovery_token(&self, kind: RecoveryKind, token_id: i64) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(token_id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn activate_user(&self, user_id: i64, token_id: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM activation_tokens WHERE id = $1 AND user_id = $2")
            .bind(token_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET is_active = true, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn reset_password(
        &self,
        user_id: i64,
        hashed_password: &str,
        token_id: i64,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted =
            sqlx::query("DELETE FROM password_reset_tokens WHERE id = $1 AND user_id = $2")
                .bind(token_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET hashed_password = $1, updated_at = now() WHERE id = $2")
            .bind(hashed_password)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn store_refresh_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        let sql = format!(
            "INSERT INTO refresh_tokens (user_id, token, expires_at) \
             VALUES ($1, $2, $3) RETURNING {TOKEN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(user_id)
            .bind(token)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(refresh_from_row(row))
    }

    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token = $1 LIMIT 1");
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(refresh_from_row))
    }

    async fn delete_refresh_token(&self, token: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_profile_by_user(&self, user_id: i64) -> StoreResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(profile_from_row).transpose()
    }

    async fn create_profile(&self, profile: NewProfile) -> StoreResult<UserProfile> {
        let sql = format!(
            "INSERT INTO user_profiles \
                (user_id, first_name, last_name, gender, date_of_birth, info, avatar) \
             VALUES ($1, $2, $3, $4::gender, $5, $6, $7) \
             RETURNING {PROFILE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(profile.user_id)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(profile.gender.as_str())
            .bind(profile.date_of_birth)
            .bind(&profile.info)
            .bind(&profile.avatar)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_or_db(e, &format!("profile for user {}", profile.user_id)))?;
        profile_from_row(row)
    }
}
