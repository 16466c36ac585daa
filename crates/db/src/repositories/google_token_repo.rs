//! Repository for `google_sheet_tokens`.

use sqlx::PgPool;
use widgetry_core::types::{DbId, Timestamp};

use crate::models::google::{GoogleSheetToken, UpsertGoogleSheetToken};

const COLUMNS: &str = "id, user_id, encrypted_access_token, encrypted_refresh_token, \
                        access_token_expires_at, created_at, updated_at";

/// Encrypted Google credentials, one row per user.
pub struct GoogleTokenRepo;

impl GoogleTokenRepo {
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<GoogleSheetToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM google_sheet_tokens WHERE user_id = $1");
        sqlx::query_as::<_, GoogleSheetToken>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace a user's credentials.
    ///
    /// The stored refresh token survives when `input` carries none.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertGoogleSheetToken,
    ) -> Result<GoogleSheetToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO google_sheet_tokens
                (user_id, encrypted_access_token, encrypted_refresh_token, access_token_expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO UPDATE SET
                encrypted_access_token = EXCLUDED.encrypted_access_token,
                encrypted_refresh_token = COALESCE(
                    EXCLUDED.encrypted_refresh_token,
                    google_sheet_tokens.encrypted_refresh_token
                ),
                access_token_expires_at = EXCLUDED.access_token_expires_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GoogleSheetToken>(&query)
            .bind(input.user_id)
            .bind(&input.encrypted_access_token)
            .bind(&input.encrypted_refresh_token)
            .bind(input.access_token_expires_at)
            .fetch_one(pool)
            .await
    }

    /// Store a refreshed access token.
    pub async fn update_access_token(
        pool: &PgPool,
        user_id: DbId,
        encrypted_access_token: &str,
        expires_at: Option<Timestamp>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE google_sheet_tokens
             SET encrypted_access_token = $2, access_token_expires_at = $3
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(encrypted_access_token)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
