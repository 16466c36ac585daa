//! Deep create/update of nested configuration sub-objects.
//!
//! Widget styling (theme, submit button, display settings, ...) is a tree
//! of optional one-to-one objects stored as JSON documents. Updates follow
//! JSON merge-patch rules: a supplied object is merged key by key (and
//! recursively), an absent key leaves the stored value alone, and an
//! explicit `null` removes it.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::CoreError;

/// A field in an update payload that distinguishes "absent" from `null`.
///
/// Use with `#[serde(default)]` so a missing key becomes [`Patch::Absent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// The supplied value, if any.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Resolve a non-nullable scalar column: only a supplied value
    /// replaces `current`.
    pub fn unwrap_or(self, current: T) -> T {
        match self {
            Patch::Value(v) => v,
            _ => current,
        }
    }

    /// Resolve a nullable scalar column: absent keeps `current`.
    pub fn resolve(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Absent => current,
            Patch::Null => None,
            Patch::Value(v) => Some(v),
        }
    }
}

/// RFC 7396 merge of `patch` into `target`.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

/// Strip `null` members recursively so a freshly created section holds
/// only supplied keys.
fn strip_nulls(value: &Value) -> Value {
    let mut out = Value::Object(serde_json::Map::new());
    merge_patch(&mut out, value);
    out
}

/// Validate that a supplied section is a JSON object.
pub fn ensure_object(section: &str, value: &Value) -> Result<(), CoreError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "'{section}' must be a JSON object"
        )))
    }
}

/// Build a section on create. Absent or `null` produce no section.
pub fn create_section(section: &str, patch: &Patch<Value>) -> Result<Option<Value>, CoreError> {
    match patch {
        Patch::Value(value) => {
            ensure_object(section, value)?;
            Ok(Some(strip_nulls(value)))
        }
        _ => Ok(None),
    }
}

/// Apply an update to a stored section.
///
/// The section is created when it does not exist yet and merged into the
/// stored document otherwise.
pub fn update_section(
    section: &str,
    existing: Option<Value>,
    patch: &Patch<Value>,
) -> Result<Option<Value>, CoreError> {
    match patch {
        Patch::Absent => Ok(existing),
        Patch::Null => Ok(None),
        Patch::Value(value) => {
            ensure_object(section, value)?;
            let mut target = existing.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
            merge_patch(&mut target, value);
            Ok(Some(target))
        }
    }
}
