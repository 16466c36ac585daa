//! Repositories for form widgets and their satellite tables.

use sqlx::{Acquire, PgExecutor, PgPool, Postgres};
use widgetry_core::notification::EmailNotificationConfig;
use widgetry_core::types::{DbId, PublicId};

use crate::models::widget::{
    AdminBrandInfo, CreatePreFill, EmailNotification, PreFill, Widget, WidgetWrite,
};

const COLUMNS: &str = "id, user_id, widget_type, name, title, description, html, script, \
    widget_fields, redirect_url, success_msg, post_submit_action, spam_protection, \
    font_family, title_size, text_size, direction, default_language, is_email_notification, \
    sheet_id, title_style, header, display_settings, submit_button, theme, footer, \
    user_brand_info, created_at, updated_at";

/// Form widgets.
pub struct WidgetRepo;

impl WidgetRepo {
    /// Insert a widget owned by `user_id` with a fresh UUID.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        input: &WidgetWrite,
    ) -> Result<Widget, sqlx::Error> {
        let query = format!(
            "INSERT INTO widgets (id, user_id, widget_type, name, title, description, html,
                script, widget_fields, redirect_url, success_msg, post_submit_action,
                spam_protection, font_family, title_size, text_size, direction,
                default_language, is_email_notification, title_style, header,
                display_settings, submit_button, theme, footer, user_brand_info)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Widget>(&query)
            .bind(uuid::Uuid::new_v4())
            .bind(user_id)
            .bind(&input.widget_type)
            .bind(&input.name)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.html)
            .bind(&input.script)
            .bind(&input.widget_fields)
            .bind(&input.redirect_url)
            .bind(&input.success_msg)
            .bind(&input.post_submit_action)
            .bind(input.spam_protection)
            .bind(&input.font_family)
            .bind(&input.title_size)
            .bind(&input.text_size)
            .bind(&input.direction)
            .bind(&input.default_language)
            .bind(input.is_email_notification)
            .bind(&input.title_style)
            .bind(&input.header)
            .bind(&input.display_settings)
            .bind(&input.submit_button)
            .bind(&input.theme)
            .bind(&input.footer)
            .bind(&input.user_brand_info)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: PublicId) -> Result<Option<Widget>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM widgets WHERE id = $1");
        sqlx::query_as::<_, Widget>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a widget only if `user_id` owns it.
    pub async fn find_owned(
        pool: &PgPool,
        id: PublicId,
        user_id: DbId,
    ) -> Result<Option<Widget>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM widgets WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Widget>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's widgets, newest first, optionally filtered by
    /// `widget_type` (case-insensitive exact match).
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        widget_type: Option<&str>,
    ) -> Result<Vec<Widget>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM widgets
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR LOWER(widget_type) = LOWER($2))
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Widget>(&query)
            .bind(user_id)
            .bind(widget_type)
            .fetch_all(pool)
            .await
    }

    /// Overwrite every writable column. Returns `None` if no row matched.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: PublicId,
        input: &WidgetWrite,
    ) -> Result<Option<Widget>, sqlx::Error> {
        let query = format!(
            "UPDATE widgets SET
                widget_type = $2, name = $3, title = $4, description = $5, html = $6,
                script = $7, widget_fields = $8, redirect_url = $9, success_msg = $10,
                post_submit_action = $11, spam_protection = $12, font_family = $13,
                title_size = $14, text_size = $15, direction = $16, default_language = $17,
                is_email_notification = $18, title_style = $19, header = $20,
                display_settings = $21, submit_button = $22, theme = $23, footer = $24,
                user_brand_info = $25
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Widget>(&query)
            .bind(id)
            .bind(&input.widget_type)
            .bind(&input.name)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.html)
            .bind(&input.script)
            .bind(&input.widget_fields)
            .bind(&input.redirect_url)
            .bind(&input.success_msg)
            .bind(&input.post_submit_action)
            .bind(input.spam_protection)
            .bind(&input.font_family)
            .bind(&input.title_size)
            .bind(&input.text_size)
            .bind(&input.direction)
            .bind(&input.default_language)
            .bind(input.is_email_notification)
            .bind(&input.title_style)
            .bind(&input.header)
            .bind(&input.display_settings)
            .bind(&input.submit_button)
            .bind(&input.theme)
            .bind(&input.footer)
            .bind(&input.user_brand_info)
            .fetch_optional(executor)
            .await
    }

    /// Delete a widget owned by `user_id`. Returns `true` if a row was removed.
    pub async fn delete_owned(
        pool: &PgPool,
        id: PublicId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM widgets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the spreadsheet created for this widget's submissions.
    pub async fn set_sheet_id(
        pool: &PgPool,
        id: PublicId,
        sheet_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE widgets SET sheet_id = $2 WHERE id = $1")
            .bind(id)
            .bind(sheet_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Email notifications
// ---------------------------------------------------------------------------

const NOTIFICATION_COLUMNS: &str = "id, widget_id, auto_responder_email, response_subject, \
    response_message, sender_name, subject, message, email, created_at, updated_at";

/// Per-widget email settings (at most one row per widget).
pub struct EmailNotificationRepo;

impl EmailNotificationRepo {
    pub async fn find_by_widget(
        pool: &PgPool,
        widget_id: PublicId,
    ) -> Result<Option<EmailNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM widget_email_notifications WHERE widget_id = $1"
        );
        sqlx::query_as::<_, EmailNotification>(&query)
            .bind(widget_id)
            .fetch_optional(pool)
            .await
    }

    /// Create or replace the widget's email settings.
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        widget_id: PublicId,
        config: &EmailNotificationConfig,
    ) -> Result<EmailNotification, sqlx::Error> {
        let query = format!(
            "INSERT INTO widget_email_notifications
                (widget_id, auto_responder_email, response_subject, response_message,
                 sender_name, subject, message, email)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (widget_id) DO UPDATE SET
                auto_responder_email = EXCLUDED.auto_responder_email,
                response_subject = EXCLUDED.response_subject,
                response_message = EXCLUDED.response_message,
                sender_name = EXCLUDED.sender_name,
                subject = EXCLUDED.subject,
                message = EXCLUDED.message,
                email = EXCLUDED.email
             RETURNING {NOTIFICATION_COLUMNS}"
        );
        sqlx::query_as::<_, EmailNotification>(&query)
            .bind(widget_id)
            .bind(config.auto_responder_email)
            .bind(&config.response_subject)
            .bind(&config.response_message)
            .bind(&config.sender_name)
            .bind(&config.subject)
            .bind(&config.message)
            .bind(&config.email)
            .fetch_one(executor)
            .await
    }

    pub async fn delete_for_widget<'e>(
        executor: impl PgExecutor<'e>,
        widget_id: PublicId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM widget_email_notifications WHERE widget_id = $1")
            .bind(widget_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Pre-fill mappings
// ---------------------------------------------------------------------------

/// URL-parameter pre-fill mappings of a widget.
pub struct PreFillRepo;

impl PreFillRepo {
    pub async fn list_for_widget(
        pool: &PgPool,
        widget_id: PublicId,
    ) -> Result<Vec<PreFill>, sqlx::Error> {
        sqlx::query_as::<_, PreFill>(
            "SELECT id, widget_id, field_id, parameter_name, created_at
             FROM widget_pre_fills WHERE widget_id = $1 ORDER BY id",
        )
        .bind(widget_id)
        .fetch_all(pool)
        .await
    }

    /// Replace all of a widget's mappings in one transaction (a savepoint
    /// when `conn` is already inside one).
    pub async fn replace_for_widget<'a>(
        conn: impl Acquire<'a, Database = Postgres>,
        widget_id: PublicId,
        items: &[CreatePreFill],
    ) -> Result<Vec<PreFill>, sqlx::Error> {
        let mut tx = conn.begin().await?;
        sqlx::query("DELETE FROM widget_pre_fills WHERE widget_id = $1")
            .bind(widget_id)
            .execute(&mut *tx)
            .await?;

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, PreFill>(
                "INSERT INTO widget_pre_fills (widget_id, field_id, parameter_name)
                 VALUES ($1, $2, $3)
                 RETURNING id, widget_id, field_id, parameter_name, created_at",
            )
            .bind(widget_id)
            .bind(&item.field_id)
            .bind(&item.parameter_name)
            .fetch_one(&mut *tx)
            .await?;
            rows.push(row);
        }
        tx.commit().await?;
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Platform brand record
// ---------------------------------------------------------------------------

/// The single platform-wide brand record.
pub struct AdminBrandInfoRepo;

impl AdminBrandInfoRepo {
    /// The most recent brand record, if one was configured.
    pub async fn current(pool: &PgPool) -> Result<Option<AdminBrandInfo>, sqlx::Error> {
        sqlx::query_as::<_, AdminBrandInfo>(
            "SELECT id, logo, name, redirect_url, created_at, updated_at
             FROM admin_brand_info ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(pool)
        .await
    }

    /// Insert a new brand record; it becomes the current one.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        logo: Option<&str>,
        redirect_url: Option<&str>,
    ) -> Result<AdminBrandInfo, sqlx::Error> {
        sqlx::query_as::<_, AdminBrandInfo>(
            "INSERT INTO admin_brand_info (name, logo, redirect_url) VALUES ($1, $2, $3)
             RETURNING id, logo, name, redirect_url, created_at, updated_at",
        )
        .bind(name)
        .bind(logo)
        .bind(redirect_url)
        .fetch_one(pool)
        .await
    }
}
