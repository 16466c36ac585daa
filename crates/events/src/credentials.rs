//! Encrypted Google credentials.

use chrono::Utc;
use widgetry_core::crypto::{TokenCipher, TokenKind};
use widgetry_core::types::{DbId, Timestamp};
use widgetry_db::models::google::UpsertGoogleSheetToken;
use widgetry_db::repositories::GoogleTokenRepo;
use widgetry_db::DbPool;
use widgetry_google::GoogleOAuthClient;

use crate::error::TaskError;

/// Reads and writes a user's Google tokens, sealing them with the
/// platform [`TokenCipher`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    pool: DbPool,
    cipher: TokenCipher,
    oauth: Option<GoogleOAuthClient>,
}

impl CredentialStore {
    /// `oauth` is needed to refresh expired access tokens; without it an
    /// expired token counts as missing.
    pub fn new(pool: DbPool, cipher: TokenCipher, oauth: Option<GoogleOAuthClient>) -> Self {
        Self {
            pool,
            cipher,
            oauth,
        }
    }

    /// Whether the user already has a refresh token on file.
    pub async fn has_refresh_token(&self, user_id: DbId) -> Result<bool, TaskError> {
        let row = GoogleTokenRepo::find_by_user(&self.pool, user_id).await?;
        Ok(row.is_some_and(|r| r.encrypted_refresh_token.is_some()))
    }

    /// Encrypt and upsert tokens. A `None` refresh token keeps the stored one.
    pub async fn store_tokens(
        &self,
        user_id: DbId,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<Timestamp>,
    ) -> Result<(), TaskError> {
        let encrypted_access_token = self.cipher.encrypt(access_token, user_id, TokenKind::Access)?;
        let encrypted_refresh_token = refresh_token
            .map(|t| self.cipher.encrypt(t, user_id, TokenKind::Refresh))
            .transpose()?;

        GoogleTokenRepo::upsert(
            &self.pool,
            &UpsertGoogleSheetToken {
                user_id,
                encrypted_access_token,
                encrypted_refresh_token,
                access_token_expires_at: expires_at,
            },
        )
        .await?;
        tracing::info!(user_id, "Stored Google credentials");
        Ok(())
    }

    /// A usable access token for `user_id`, refreshing it through Google
    /// when it has expired. `None` when the user has no usable credentials.
    pub async fn access_token(&self, user_id: DbId) -> Result<Option<String>, TaskError> {
        let Some(row) = GoogleTokenRepo::find_by_user(&self.pool, user_id).await? else {
            return Ok(None);
        };

        if !row.access_expired(Utc::now()) {
            let token = self
                .cipher
                .decrypt(&row.encrypted_access_token, user_id, TokenKind::Access)?;
            return Ok(Some(token));
        }

        let (Some(sealed_refresh), Some(oauth)) = (&row.encrypted_refresh_token, &self.oauth)
        else {
            tracing::warn!(user_id, "Google access token expired and cannot be refreshed");
            return Ok(None);
        };

        let refresh_token = self
            .cipher
            .decrypt(sealed_refresh, user_id, TokenKind::Refresh)?;
        let refreshed = oauth.refresh_access_token(&refresh_token).await?;
        let sealed = self
            .cipher
            .encrypt(&refreshed.access_token, user_id, TokenKind::Access)?;
        GoogleTokenRepo::update_access_token(&self.pool, user_id, &sealed, refreshed.expires_at())
            .await?;

        tracing::debug!(user_id, "Refreshed Google access token");
        Ok(Some(refreshed.access_token))
    }
}
