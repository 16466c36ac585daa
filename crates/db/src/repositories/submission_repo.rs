//! Repositories for `submissions` and `widget_files`.

use serde_json::{Map, Value};
use sqlx::PgPool;
use widgetry_core::types::PublicId;

use crate::models::submission::{CreateWidgetFile, Submission, WidgetFile};

/// Stored form submissions.
pub struct SubmissionRepo;

impl SubmissionRepo {
    pub async fn create(
        pool: &PgPool,
        widget_id: PublicId,
        data: &Map<String, Value>,
    ) -> Result<Submission, sqlx::Error> {
        sqlx::query_as::<_, Submission>(
            "INSERT INTO submissions (widget_id, data) VALUES ($1, $2)
             RETURNING id, widget_id, data, created_at",
        )
        .bind(widget_id)
        .bind(Value::Object(data.clone()))
        .fetch_one(pool)
        .await
    }

    /// All submissions of a widget, oldest first.
    pub async fn list_for_widget(
        pool: &PgPool,
        widget_id: PublicId,
    ) -> Result<Vec<Submission>, sqlx::Error> {
        sqlx::query_as::<_, Submission>(
            "SELECT id, widget_id, data, created_at FROM submissions
             WHERE widget_id = $1 ORDER BY id",
        )
        .bind(widget_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_for_widget(pool: &PgPool, widget_id: PublicId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submissions WHERE widget_id = $1")
            .bind(widget_id)
            .fetch_one(pool)
            .await
    }
}

/// Files uploaded through `file` fields.
pub struct WidgetFileRepo;

impl WidgetFileRepo {
    pub async fn create(pool: &PgPool, input: &CreateWidgetFile) -> Result<WidgetFile, sqlx::Error> {
        sqlx::query_as::<_, WidgetFile>(
            "INSERT INTO widget_files (widget_id, file_path, original_name) VALUES ($1, $2, $3)
             RETURNING id, widget_id, file_path, original_name, created_at",
        )
        .bind(input.widget_id)
        .bind(&input.file_path)
        .bind(&input.original_name)
        .fetch_one(pool)
        .await
    }
}
