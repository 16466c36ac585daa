//! Standalone image uploads.

use serde::Serialize;
use sqlx::FromRow;
use widgetry_core::types::{DbId, Timestamp};

/// A row from `image_uploads`. `file_path` is relative to the media root.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImageUpload {
    pub id: DbId,
    pub file_path: String,
    pub created_at: Timestamp,
}
