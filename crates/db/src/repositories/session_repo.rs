//! Refresh-token sessions.
//!
//! A session is live while `is_revoked` is false and `expires_at` is in the
//! future. Rotation revokes the presented session and opens its successor in
//! one statement, so a token can be exchanged at most once.

use sqlx::PgPool;
use storefront_core::types::{DbId, Timestamp};

use crate::models::session::NewSession;

pub struct SessionRepo;

impl SessionRepo {
    /// Persist a new session, returning its id.
    pub async fn open(pool: &PgPool, session: &NewSession) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(session.user_id)
        .bind(&session.refresh_token_hash)
        .bind(session.expires_at)
        .fetch_one(pool)
        .await
    }

    /// Exchange the live session identified by `presented_hash` for a new
    /// one owned by the same user. Returns that user id, or `None` when the
    /// presented token is unknown, expired or already used.
    pub async fn rotate(
        pool: &PgPool,
        presented_hash: &str,
        new_hash: &str,
        expires_at: Timestamp,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "WITH revoked AS ( \
                 UPDATE user_sessions SET is_revoked = true \
                  WHERE refresh_token_hash = $1 \
                    AND is_revoked = false \
                    AND expires_at > NOW() \
                 RETURNING user_id \
             ) \
             INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at) \
             SELECT user_id, $2, $3 FROM revoked \
             RETURNING user_id",
        )
        .bind(presented_hash)
        .bind(new_hash)
        .bind(expires_at)
        .fetch_optional(pool)
        .await
    }

    /// Revoke every live session of a user, returning how many were closed.
    pub async fn close_all(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true \
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
