/// Refresh token storage
///
/// Only the SHA-256 digest of a refresh JWT is persisted. A user holds at most
/// one live refresh token: a new login or refresh supersedes the previous one.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgExecutor;

/// Stored refresh token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    /// Hex-encoded SHA-256 of the token
    pub token_hash: String,

    pub user_id: i64,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

/// Input for storing a refresh token
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token_hash: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Hashes a refresh token for storage and lookup
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

impl RefreshToken {
    /// Returns true once `expires_at` has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub async fn create<'e, E>(executor: E, data: NewRefreshToken) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token_hash, user_id, expires_at, created_at
            "#,
        )
        .bind(data.token_hash)
        .bind(data.user_id)
        .bind(data.expires_at)
        .fetch_one(executor)
        .await?;

        Ok(token)
    }

    pub async fn find_by_hash<'e, E>(
        executor: E,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT token_hash, user_id, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(executor)
        .await?;

        Ok(token)
    }

    /// Deletes every refresh token of a user, returning how many were removed
    pub async fn delete_for_user<'e, E>(executor: E, user_id: i64) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes tokens that expired before `now`
    pub async fn delete_expired<'e, E>(executor: E, now: DateTime<Utc>) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
