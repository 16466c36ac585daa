//! Stored form submissions and their uploaded files.

use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use widgetry_core::types::{DbId, PublicId, Timestamp};

/// A row from the `submissions` table. `data` maps field label to value.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Submission {
    pub id: DbId,
    pub widget_id: PublicId,
    pub data: Value,
    pub created_at: Timestamp,
}

/// A row from `widget_files`. `file_path` is relative to the media root.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WidgetFile {
    pub id: DbId,
    pub widget_id: PublicId,
    pub file_path: String,
    pub original_name: String,
    pub created_at: Timestamp,
}

/// DTO for recording a stored upload.
#[derive(Debug)]
pub struct CreateWidgetFile {
    pub widget_id: PublicId,
    pub file_path: String,
    pub original_name: String,
}
