//! Admin-managed form templates.

use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use widgetry_core::types::{DbId, Timestamp};

/// A row from `form_templates`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormTemplate {
    pub id: DbId,
    pub image: Option<String>,
    pub fields: Value,
    pub header_enabled: bool,
    pub header_title: String,
    pub header_caption: String,
    pub submit_button: Option<Value>,
    pub footer: String,
    pub embed_type: String,
    pub color_scheme: String,
    pub accent_color: String,
    pub bg_color: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Every writable template column.
#[derive(Debug, Clone, Default)]
pub struct FormTemplateWrite {
    pub image: Option<String>,
    pub fields: Value,
    pub header_enabled: bool,
    pub header_title: String,
    pub header_caption: String,
    pub submit_button: Option<Value>,
    pub footer: String,
    pub embed_type: String,
    pub color_scheme: String,
    pub accent_color: String,
    pub bg_color: String,
}

impl From<&FormTemplate> for FormTemplateWrite {
    fn from(t: &FormTemplate) -> Self {
        Self {
            image: t.image.clone(),
            fields: t.fields.clone(),
            header_enabled: t.header_enabled,
            header_title: t.header_title.clone(),
            header_caption: t.header_caption.clone(),
            submit_button: t.submit_button.clone(),
            footer: t.footer.clone(),
            embed_type: t.embed_type.clone(),
            color_scheme: t.color_scheme.clone(),
            accent_color: t.accent_color.clone(),
            bg_color: t.bg_color.clone(),
        }
    }
}
