//! CSV export of stored submissions.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::CoreError;

/// Render submissions as CSV.
///
/// The header is the sorted union of every key seen across all records;
/// each record becomes one row with empty cells for keys it lacks.
/// Non-string values are written as their JSON text.
pub fn submissions_to_csv(records: &[Map<String, Value>]) -> Result<Vec<u8>, CoreError> {
    let keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&keys).map_err(csv_error)?;

    for record in records {
        let row = keys.iter().map(|key| match record.get(*key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        writer.write_record(row).map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| CoreError::Internal(format!("CSV flush failed: {e}")))
}

/// `Content-Disposition` file name for a widget's export.
pub fn export_file_name(widget_id: &uuid::Uuid) -> String {
    format!("widget_{widget_id}_data.csv")
}

fn csv_error(e: csv::Error) -> CoreError {
    CoreError::Internal(format!("CSV write failed: {e}"))
}
