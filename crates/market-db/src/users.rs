//! Database operations for `users` and `user_sessions`.

use chrono::{DateTime, Utc};
use market_core::PasswordHash;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    #[must_use]
    pub fn stored_password(&self) -> PasswordHash {
        PasswordHash {
            hash: self.password_hash.clone(),
            salt: self.password_salt.clone(),
        }
    }
}

/// Inserts a new user and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a duplicate username
/// surfaces as a unique violation (see [`DbError::is_unique_violation`]).
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password: &PasswordHash,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, email, password_hash, password_salt) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, username, email, password_hash, password_salt, created_at",
    )
    .bind(username)
    .bind(email)
    .bind(&password.hash)
    .bind(&password.salt)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the user with the given username, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, password_salt, created_at \
         FROM users \
         WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Stores a session under the digest of its bearer token.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_session(
    pool: &PgPool,
    user_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO user_sessions (user_id, token_hash, expires_at) \
         VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Resolves an unexpired session digest to its user.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_session_token(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT u.id, u.username, u.email, u.password_hash, u.password_salt, u.created_at \
         FROM user_sessions s \
         JOIN users u ON u.id = s.user_id \
         WHERE s.token_hash = $1 AND s.expires_at > NOW()",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes the session with the given digest. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_session(pool: &PgPool, token_hash: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM user_sessions WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Removes every expired session belonging to `user_id`. Returns the count removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_expired_sessions(pool: &PgPool, user_id: i64) -> Result<u64, DbError> {
    let result =
        sqlx::query("DELETE FROM user_sessions WHERE user_id = $1 AND expires_at <= NOW()")
            .bind(user_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}
