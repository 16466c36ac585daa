//! Periodic purge of dead auth state.
//!
//! Removes expired or revoked refresh-token sessions and OAuth `state`
//! values whose handshake was never completed.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use widgetry_db::repositories::{OAuthStateRepo, SessionRepo};

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// OAuth handshakes older than this are abandoned.
const OAUTH_STATE_TTL_MINS: i64 = 60;

/// One cleanup pass. Returns `(sessions, oauth_states)` removed.
pub async fn purge_once(pool: &PgPool) -> Result<(u64, u64), sqlx::Error> {
    let sessions = SessionRepo::cleanup_expired(pool).await?;
    let cutoff = Utc::now() - chrono::Duration::minutes(OAUTH_STATE_TTL_MINS);
    let states = OAuthStateRepo::purge_older_than(pool, cutoff).await?;
    Ok((sessions, states))
}

/// Run cleanup passes until `cancel` fires.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Session cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match purge_once(&pool).await {
                    Ok((0, 0)) => tracing::debug!("Session cleanup: nothing to purge"),
                    Ok((sessions, oauth_states)) => {
                        tracing::info!(sessions, oauth_states, "Session cleanup: purged rows");
                    }
                    Err(e) => tracing::error!(error = %e, "Session cleanup failed"),
                }
            }
        }
    }
}
