//! Dynamic form field schema.
//!
//! A widget stores the list of fields its form renders. The schema is what
//! gets validated on save and what drives submission processing; submitted
//! values themselves are stored as an opaque label/value map.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Field type whose value comes from an uploaded file.
pub const FIELD_TYPE_FILE: &str = "file";

/// Checkbox-style agreement field. Only `"true"` counts as accepted and the
/// value is never recorded.
pub const FIELD_TYPE_CONSENT: &str = "consent";

/// Field type whose value is used as the auto-responder recipient.
pub const FIELD_TYPE_EMAIL: &str = "email";

/// One entry of a widget's `widget_fields` list.
///
/// Unknown keys sent by the builder UI (placeholder, options, width, ...)
/// are kept in `extra` so the stored schema round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FieldDescriptor {
    pub fn is_file(&self) -> bool {
        self.field_type == FIELD_TYPE_FILE
    }

    pub fn is_consent(&self) -> bool {
        self.field_type == FIELD_TYPE_CONSENT
    }
}

/// Parse and validate a raw `widget_fields` JSON value.
///
/// The value must be an array of descriptors with non-empty, unique ids and
/// non-empty labels.
pub fn parse_schema(raw: &serde_json::Value) -> Result<Vec<FieldDescriptor>, CoreError> {
    let fields: Vec<FieldDescriptor> = serde_json::from_value(raw.clone())
        .map_err(|e| CoreError::Validation(format!("Invalid widget_fields: {e}")))?;
    validate_schema(&fields)?;
    Ok(fields)
}

/// Check descriptor-level invariants of an already parsed schema.
pub fn validate_schema(fields: &[FieldDescriptor]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        if field.id.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "widget_fields[{index}] must have a non-empty id"
            )));
        }
        if field.label.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "widget_fields[{index}] ('{}') must have a non-empty label",
                field.id
            )));
        }
        if field.field_type.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "widget_fields[{index}] ('{}') must have a type",
                field.id
            )));
        }
        if !seen.insert(field.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate field id '{}' in widget_fields",
                field.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_builder_schema_and_keeps_extra_keys() {
        let raw = json!([
            {"id": "f1", "type": "text", "required": true, "label": "Name", "placeholder": "Jane"},
            {"id": "f2", "type": "email", "required": false, "label": "Email"}
        ]);
        let fields = parse_schema(&raw).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields[0].required);
        assert_eq!(fields[0].extra["placeholder"], "Jane");
        assert_eq!(serde_json::to_value(&fields).unwrap(), raw);
    }

    #[test]
    fn required_defaults_to_false() {
        let fields = parse_schema(&json!([{"id": "a", "type": "text", "label": "A"}])).unwrap();
        assert!(!fields[0].required);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let raw = json!([
            {"id": "x", "type": "text", "label": "One"},
            {"id": "x", "type": "text", "label": "Two"}
        ]);
        assert_matches!(parse_schema(&raw), Err(CoreError::Validation(msg)) if msg.contains("Duplicate"));
    }

    #[test]
    fn rejects_missing_label() {
        let raw = json!([{"id": "x", "type": "text", "label": "  "}]);
        assert_matches!(parse_schema(&raw), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_non_array() {
        assert_matches!(parse_schema(&json!({"id": "x"})), Err(CoreError::Validation(_)));
    }
}
