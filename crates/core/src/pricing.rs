//! Pricing table rules: column patch classification and the public view.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config_merge::merge_patch;
use crate::error::CoreError;
use crate::types::DbId;

/// What an item of a container update's `content` list asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOp {
    /// `{"id": N}` and nothing else.
    Delete(DbId),
    /// `{"id": N, ...fields}`: merge fields into column N.
    Update(DbId, Map<String, Value>),
    /// No id: a new column.
    Create(Map<String, Value>),
}

/// Classify every item of a `content` update list.
pub fn classify_column_patches(items: &[Value]) -> Result<Vec<ColumnOp>, CoreError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut fields = item.as_object().cloned().ok_or_else(|| {
                CoreError::Validation(format!("content[{index}] must be a JSON object"))
            })?;
            match fields.remove("id") {
                None | Some(Value::Null) => {
                    validate_new_column(&fields, index)?;
                    Ok(ColumnOp::Create(fields))
                }
                Some(id) => {
                    let id = id.as_i64().ok_or_else(|| {
                        CoreError::Validation(format!("content[{index}].id must be an integer"))
                    })?;
                    if fields.is_empty() {
                        Ok(ColumnOp::Delete(id))
                    } else {
                        Ok(ColumnOp::Update(id, fields))
                    }
                }
            }
        })
        .collect()
}

/// A new column needs a button with a link.
pub fn validate_new_column(fields: &Map<String, Value>, index: usize) -> Result<(), CoreError> {
    let button = fields.get("button").and_then(Value::as_object).ok_or_else(|| {
        CoreError::Validation(format!("content[{index}].button is required"))
    })?;
    if !button.get("link").is_some_and(Value::is_object) {
        return Err(CoreError::Validation(format!(
            "content[{index}].button.link is required"
        )));
    }
    Ok(())
}

/// Merge an update into a stored column body. Lists such as `features`
/// are replaced wholesale; an update without them keeps the stored list.
pub fn apply_column_update(body: &mut Value, fields: &Map<String, Value>) {
    merge_patch(body, &Value::Object(fields.clone()));
}

/// Which column parts the layout shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutFlags {
    pub title: bool,
    pub picture: bool,
    pub features: bool,
    pub price: bool,
    pub button: bool,
}

impl Default for LayoutFlags {
    fn default() -> Self {
        Self {
            title: true,
            picture: true,
            features: true,
            price: true,
            button: true,
        }
    }
}

impl LayoutFlags {
    /// Read flags from a stored layout document; missing flags count as on.
    pub fn from_layout(layout: Option<&Value>) -> Self {
        layout
            .and_then(|l| serde_json::from_value(l.clone()).ok())
            .unwrap_or_default()
    }

    /// Remove the parts of a rendered column the layout hides.
    pub fn apply(&self, column: &mut Map<String, Value>) {
        let hidden = [
            ("title", self.title),
            ("picture", self.picture),
            ("features", self.features),
            ("price", self.price),
            ("button", self.button),
        ];
        for (key, visible) in hidden {
            if !visible {
                column.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn classifies_delete_update_and_create() {
        let items = vec![
            json!({"id": 4}),
            json!({"id": 5, "title": "Pro"}),
            json!({"title": "Team", "button": {"text": "Buy", "link": {"link_type": "url", "link_value": "https://x.io"}}}),
        ];
        let ops = classify_column_patches(&items).unwrap();
        assert_eq!(ops[0], ColumnOp::Delete(4));
        assert_matches!(&ops[1], ColumnOp::Update(5, f) if f["title"] == "Pro" && !f.contains_key("id"));
        assert_matches!(&ops[2], ColumnOp::Create(f) if f["title"] == "Team");
    }

    #[test]
    fn new_column_requires_button_link() {
        let err = classify_column_patches(&[json!({"title": "No button"})]).unwrap_err();
        assert_matches!(err, CoreError::Validation(m) if m.contains("button is required"));

        let err = classify_column_patches(&[json!({"button": {"text": "Buy"}})]).unwrap_err();
        assert_matches!(err, CoreError::Validation(m) if m.contains("link"));
    }

    #[test]
    fn non_integer_id_is_rejected() {
        assert_matches!(
            classify_column_patches(&[json!({"id": "abc", "title": "x"})]),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn column_update_merges_price_and_replaces_features() {
        let mut body = json!({
            "title": "Basic",
            "price": {"currency": "$", "amount": "9", "caption": "per month"},
            "features": [{"text": "A"}, {"text": "B"}]
        });
        let patch = json!({"price": {"amount": "12"}, "features": [{"text": "C"}]});
        apply_column_update(&mut body, patch.as_object().unwrap());

        assert_eq!(body["price"]["amount"], "12");
        assert_eq!(body["price"]["caption"], "per month");
        assert_eq!(body["features"], json!([{"text": "C"}]));
        assert_eq!(body["title"], "Basic");
    }

    #[test]
    fn column_update_without_features_keeps_them() {
        let mut body = json!({"title": "Basic", "features": [{"text": "A"}]});
        apply_column_update(&mut body, json!({"title": "Starter"}).as_object().unwrap());

        assert_eq!(body["title"], "Starter");
        assert_eq!(body["features"], json!([{"text": "A"}]));
    }

    #[test]
    fn layout_hides_disabled_parts() {
        let flags = LayoutFlags::from_layout(Some(&json!({"layout_type": "cards", "picture": false, "price": false})));
        let mut column = json!({"title": "Pro", "picture": "p.png", "price": {}, "button": {}})
            .as_object()
            .unwrap()
            .clone();
        flags.apply(&mut column);
        assert!(column.contains_key("title"));
        assert!(column.contains_key("button"));
        assert!(!column.contains_key("picture"));
        assert!(!column.contains_key("price"));
    }

    #[test]
    fn missing_layout_shows_everything() {
        assert_eq!(LayoutFlags::from_layout(None), LayoutFlags::default());
    }
}
