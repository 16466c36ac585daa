//! Repository for `oauth_states`.

use sqlx::PgPool;
use widgetry_core::types::Timestamp;

use crate::models::google::OAuthState;

/// Pending OAuth `state` values.
pub struct OAuthStateRepo;

impl OAuthStateRepo {
    pub async fn create(pool: &PgPool, state: &str) -> Result<OAuthState, sqlx::Error> {
        sqlx::query_as::<_, OAuthState>(
            "INSERT INTO oauth_states (session_state) VALUES ($1)
             RETURNING id, session_state, created_at",
        )
        .bind(state)
        .fetch_one(pool)
        .await
    }

    /// Delete the row for `state`. Returns `true` when it existed, so each
    /// value is accepted at most once.
    pub async fn consume(pool: &PgPool, state: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM oauth_states WHERE session_state = $1")
            .bind(state)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop handshakes that were started before `cutoff` and never finished.
    pub async fn purge_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM oauth_states WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
