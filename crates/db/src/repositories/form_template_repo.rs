//! Repository for `form_templates`.

use sqlx::PgPool;
use widgetry_core::types::DbId;

use crate::models::form_template::{FormTemplate, FormTemplateWrite};

const COLUMNS: &str = "id, image, fields, header_enabled, header_title, header_caption, \
    submit_button, footer, embed_type, color_scheme, accent_color, bg_color, created_at, updated_at";

/// Admin-managed form templates.
pub struct FormTemplateRepo;

impl FormTemplateRepo {
    pub async fn create(pool: &PgPool, input: &FormTemplateWrite) -> Result<FormTemplate, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_templates (image, fields, header_enabled, header_title,
                header_caption, submit_button, footer, embed_type, color_scheme,
                accent_color, bg_color)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormTemplate>(&query)
            .bind(&input.image)
            .bind(&input.fields)
            .bind(input.header_enabled)
            .bind(&input.header_title)
            .bind(&input.header_caption)
            .bind(&input.submit_button)
            .bind(&input.footer)
            .bind(&input.embed_type)
            .bind(&input.color_scheme)
            .bind(&input.accent_color)
            .bind(&input.bg_color)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<FormTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM form_templates WHERE id = $1");
        sqlx::query_as::<_, FormTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<FormTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM form_templates ORDER BY id");
        sqlx::query_as::<_, FormTemplate>(&query).fetch_all(pool).await
    }

    /// Overwrite every writable column. Returns `None` if no row matched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &FormTemplateWrite,
    ) -> Result<Option<FormTemplate>, sqlx::Error> {
        let query = format!(
            "UPDATE form_templates SET
                image = $2, fields = $3, header_enabled = $4, header_title = $5,
                header_caption = $6, submit_button = $7, footer = $8, embed_type = $9,
                color_scheme = $10, accent_color = $11, bg_color = $12
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormTemplate>(&query)
            .bind(id)
            .bind(&input.image)
            .bind(&input.fields)
            .bind(input.header_enabled)
            .bind(&input.header_title)
            .bind(&input.header_caption)
            .bind(&input.submit_button)
            .bind(&input.footer)
            .bind(&input.embed_type)
            .bind(&input.color_scheme)
            .bind(&input.accent_color)
            .bind(&input.bg_color)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM form_templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
