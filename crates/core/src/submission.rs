//! Form submission processing.
//!
//! Submitted values are checked against the widget's field schema, in
//! schema order, and turned into an ordered list of recorded values. File
//! uploads are validated here but stored by the caller: a processed file
//! field carries an empty value until [`ProcessedSubmission::attach_upload`]
//! supplies the stored file's URL.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::widget_fields::{FieldDescriptor, FIELD_TYPE_EMAIL};

/// Name of the form value carrying the reCAPTCHA response token.
pub const RECAPTCHA_TOKEN_FIELD: &str = "recaptchaToken";

/// Raw values of one submission, keyed by field id.
#[derive(Debug, Default, Clone)]
pub struct SubmissionInput {
    pub values: HashMap<String, String>,
    /// Field ids that received at least one uploaded file.
    pub uploads: HashSet<String>,
}

impl SubmissionInput {
    /// Build an input from a JSON object body.
    ///
    /// Strings are taken as-is, booleans and numbers are rendered to their
    /// JSON text (so a consent checkbox sent as `true` reads `"true"`), and
    /// `null` counts as absent.
    pub fn from_json(body: &serde_json::Map<String, serde_json::Value>) -> Self {
        let values = body
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((key.clone(), text))
            })
            .collect();
        Self {
            values,
            uploads: HashSet::new(),
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// One recorded value, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedField {
    pub field_id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub value: String,
}

/// Per-field error messages keyed by field label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    fn required(&mut self, label: &str) {
        self.0.insert(label.to_string(), format!("{label} is required."));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The accepted values of a submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedSubmission {
    pub fields: Vec<ProcessedField>,
}

/// Validate `input` against `schema`.
///
/// Rules, applied per field:
/// - `file`: required without an upload is an error; an upload is recorded
///   with a pending (empty) value.
/// - `consent`: required and not exactly `"true"` is an error; never
///   recorded.
/// - anything else: the trimmed value (missing reads as empty); required
///   and empty is an error.
///
/// All errors are collected before returning.
pub fn process_fields(
    schema: &[FieldDescriptor],
    input: &SubmissionInput,
) -> Result<ProcessedSubmission, FieldErrors> {
    let mut fields = Vec::with_capacity(schema.len());
    let mut errors = FieldErrors::default();

    for field in schema {
        if field.is_file() {
            let uploaded = input.uploads.contains(&field.id);
            if field.required && !uploaded {
                errors.required(&field.label);
            } else if uploaded {
                fields.push(ProcessedField {
                    field_id: field.id.clone(),
                    label: field.label.clone(),
                    field_type: field.field_type.clone(),
                    value: String::new(),
                });
            }
            continue;
        }

        let value = input.value(&field.id).unwrap_or("").trim();

        if field.is_consent() {
            if field.required && value != "true" {
                errors.required(&field.label);
            }
            continue;
        }

        if field.required && value.is_empty() {
            errors.required(&field.label);
            continue;
        }

        fields.push(ProcessedField {
            field_id: field.id.clone(),
            label: field.label.clone(),
            field_type: field.field_type.clone(),
            value: value.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(ProcessedSubmission { fields })
    } else {
        Err(errors)
    }
}

impl ProcessedSubmission {
    /// Ids of file fields waiting for their stored URL.
    pub fn pending_uploads(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.field_type == crate::widget_fields::FIELD_TYPE_FILE && f.value.is_empty())
            .map(|f| f.field_id.as_str())
    }

    /// Record the URL of a stored upload for `field_id`.
    pub fn attach_upload(&mut self, field_id: &str, url: String) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.field_id == field_id) {
            field.value = url;
        }
    }

    /// First value of an `email` field, used as the auto-responder recipient.
    pub fn email_receiver(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.field_type == FIELD_TYPE_EMAIL)
            .map(|f| f.value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// `label: value` lines, one per recorded field.
    pub fn summary(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}: {}", f.label, f.value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The persisted record: label to value.
    pub fn to_record(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|f| (f.label.clone(), serde_json::Value::String(f.value.clone())))
            .collect()
    }

    /// Spreadsheet row values in schema order.
    pub fn sheet_values(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.value.clone()).collect()
    }

    /// Spreadsheet header used when a new sheet is created: lowercased labels.
    pub fn sheet_header(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.label.to_lowercase()).collect()
    }
}

/// What the embedded form does after a successful submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSubmitAction {
    #[default]
    SuccessMsg,
    RedirectUrl,
    HideForm,
}

impl PostSubmitAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuccessMsg => "success_msg",
            Self::RedirectUrl => "redirect_url",
            Self::HideForm => "hide_form",
        }
    }

    /// Parse the stored column value; unknown values fall back to the default.
    pub fn parse(value: &str) -> Self {
        match value {
            "redirect_url" => Self::RedirectUrl,
            "hide_form" => Self::HideForm,
            _ => Self::SuccessMsg,
        }
    }
}

/// Response body returned to the embedded form after a submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    pub action: PostSubmitAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl SubmitOutcome {
    pub fn for_action(
        action: PostSubmitAction,
        success_msg: &str,
        redirect_url: Option<&str>,
    ) -> Self {
        let value = match action {
            PostSubmitAction::SuccessMsg => Some(success_msg.to_string()),
            PostSubmitAction::RedirectUrl => Some(redirect_url.unwrap_or_default().to_string()),
            PostSubmitAction::HideForm => None,
        };
        Self { action, value }
    }
}
