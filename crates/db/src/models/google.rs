//! Stored Google credentials and pending OAuth handshakes.

use sqlx::FromRow;
use widgetry_core::types::{DbId, Timestamp};

/// A row from `google_sheet_tokens`. Both tokens are sealed with
/// `widgetry_core::crypto::TokenCipher`.
#[derive(Debug, Clone, FromRow)]
pub struct GoogleSheetToken {
    pub id: DbId,
    pub user_id: DbId,
    pub encrypted_access_token: String,
    pub encrypted_refresh_token: Option<String>,
    pub access_token_expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GoogleSheetToken {
    /// Whether the access token is past its expiry at `now`.
    pub fn access_expired(&self, now: Timestamp) -> bool {
        self.access_token_expires_at.is_some_and(|at| at <= now)
    }
}

/// DTO for storing freshly issued credentials.
///
/// A `None` refresh token keeps whatever refresh token is already stored.
#[derive(Debug)]
pub struct UpsertGoogleSheetToken {
    pub user_id: DbId,
    pub encrypted_access_token: String,
    pub encrypted_refresh_token: Option<String>,
    pub access_token_expires_at: Option<Timestamp>,
}

/// A row from `oauth_states`.
#[derive(Debug, Clone, FromRow)]
pub struct OAuthState {
    pub id: DbId,
    pub session_state: String,
    pub created_at: Timestamp,
}
