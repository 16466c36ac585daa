//! Form widget models: the widget row, its email notification settings,
//! pre-fill mappings and the platform brand record.

use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use widgetry_core::notification::EmailNotificationConfig;
use widgetry_core::types::{DbId, PublicId, Timestamp};

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `widgets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Widget {
    pub id: PublicId,
    pub user_id: DbId,
    pub widget_type: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub html: String,
    pub script: String,
    pub widget_fields: Value,
    pub redirect_url: Option<String>,
    pub success_msg: String,
    pub post_submit_action: String,
    pub spam_protection: bool,
    pub font_family: Option<String>,
    pub title_size: Option<String>,
    pub text_size: Option<String>,
    pub direction: String,
    pub default_language: String,
    pub is_email_notification: bool,
    pub sheet_id: Option<String>,
    pub title_style: Option<Value>,
    pub header: Option<Value>,
    pub display_settings: Option<Value>,
    pub submit_button: Option<Value>,
    pub theme: Option<Value>,
    pub footer: Option<Value>,
    pub user_brand_info: Option<Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from `widget_email_notifications`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailNotification {
    pub id: DbId,
    pub widget_id: PublicId,
    pub auto_responder_email: bool,
    pub response_subject: String,
    pub response_message: String,
    pub sender_name: String,
    pub subject: String,
    pub message: String,
    pub email: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EmailNotification {
    pub fn config(&self) -> EmailNotificationConfig {
        EmailNotificationConfig {
            auto_responder_email: self.auto_responder_email,
            response_subject: self.response_subject.clone(),
            response_message: self.response_message.clone(),
            sender_name: self.sender_name.clone(),
            subject: self.subject.clone(),
            message: self.message.clone(),
            email: self.email.clone(),
        }
    }
}

/// A row from `widget_pre_fills`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PreFill {
    pub id: DbId,
    #[serde(skip)]
    pub widget_id: PublicId,
    pub field_id: String,
    pub parameter_name: String,
    #[serde(skip)]
    pub created_at: Timestamp,
}

/// A row from `admin_brand_info`.
#[derive(Debug, Clone, FromRow)]
pub struct AdminBrandInfo {
    pub id: DbId,
    pub logo: Option<String>,
    pub name: String,
    pub redirect_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Every writable widget column.
///
/// Creates and updates both write the full set; callers resolve partial
/// updates against the stored row before saving.
#[derive(Debug, Clone, Default)]
pub struct WidgetWrite {
    pub widget_type: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub html: String,
    pub script: String,
    pub widget_fields: Value,
    pub redirect_url: Option<String>,
    pub success_msg: String,
    pub post_submit_action: String,
    pub spam_protection: bool,
    pub font_family: Option<String>,
    pub title_size: Option<String>,
    pub text_size: Option<String>,
    pub direction: String,
    pub default_language: String,
    pub is_email_notification: bool,
    pub title_style: Option<Value>,
    pub header: Option<Value>,
    pub display_settings: Option<Value>,
    pub submit_button: Option<Value>,
    pub theme: Option<Value>,
    pub footer: Option<Value>,
    pub user_brand_info: Option<Value>,
}

impl From<&Widget> for WidgetWrite {
    fn from(w: &Widget) -> Self {
        Self {
            widget_type: w.widget_type.clone(),
            name: w.name.clone(),
            title: w.title.clone(),
            description: w.description.clone(),
            html: w.html.clone(),
            script: w.script.clone(),
            widget_fields: w.widget_fields.clone(),
            redirect_url: w.redirect_url.clone(),
            success_msg: w.success_msg.clone(),
            post_submit_action: w.post_submit_action.clone(),
            spam_protection: w.spam_protection,
            font_family: w.font_family.clone(),
            title_size: w.title_size.clone(),
            text_size: w.text_size.clone(),
            direction: w.direction.clone(),
            default_language: w.default_language.clone(),
            is_email_notification: w.is_email_notification,
            title_style: w.title_style.clone(),
            header: w.header.clone(),
            display_settings: w.display_settings.clone(),
            submit_button: w.submit_button.clone(),
            theme: w.theme.clone(),
            footer: w.footer.clone(),
            user_brand_info: w.user_brand_info.clone(),
        }
    }
}

/// DTO for one pre-fill mapping.
#[derive(Debug, Clone)]
pub struct CreatePreFill {
    pub field_id: String,
    pub parameter_name: String,
}
