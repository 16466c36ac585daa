//! Pricing table models.

use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use widgetry_core::types::{DbId, PublicId, Timestamp};

/// A row from `pricing_containers`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PricingContainer {
    pub id: PublicId,
    pub user_id: DbId,
    pub title: String,
    pub layout: Value,
    pub appearance: Value,
    pub sheet_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from `pricing_columns`. `body` holds the column document
/// (title, caption, price, button, features, picture, ...).
#[derive(Debug, Clone, FromRow)]
pub struct PricingColumn {
    pub id: DbId,
    pub container_id: PublicId,
    pub position: i32,
    pub body: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PricingColumn {
    /// The column document with its id merged in.
    pub fn to_json(&self) -> serde_json::Map<String, Value> {
        let mut out = self.body.as_object().cloned().unwrap_or_default();
        out.insert("id".into(), Value::from(self.id));
        out
    }
}

/// Writable container columns.
#[derive(Debug, Clone)]
pub struct PricingContainerWrite {
    pub title: String,
    pub layout: Value,
    pub appearance: Value,
}
