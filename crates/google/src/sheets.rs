//! Google Sheets v4: spreadsheet creation and row appends.

use serde::Deserialize;
use serde_json::json;

use crate::error::GoogleError;

const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Range rows are appended to in newly created spreadsheets.
pub const DEFAULT_RANGE: &str = "Sheet1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    spreadsheet_id: String,
}

/// Sheets API client. Calls are authorized per user with a bearer token.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
}

impl SheetsClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, SHEETS_URL.to_string())
    }

    pub fn with_base_url(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Create an empty spreadsheet titled `title`; returns its id.
    pub async fn create_spreadsheet(
        &self,
        access_token: &str,
        title: &str,
    ) -> Result<String, GoogleError> {
        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(access_token)
            .json(&json!({ "properties": { "title": title } }))
            .send()
            .await?;
        let sheet: Spreadsheet = GoogleError::check(response).await?.json().await?;
        tracing::info!(spreadsheet_id = %sheet.spreadsheet_id, "Created spreadsheet");
        Ok(sheet.spreadsheet_id)
    }

    /// Append `rows` after the last row of the first sheet, values stored
    /// as entered.
    pub async fn append_rows(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
        rows: &[Vec<String>],
    ) -> Result<(), GoogleError> {
        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            DEFAULT_RANGE,
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        GoogleError::check(response).await?;
        tracing::debug!(spreadsheet_id, rows = rows.len(), "Appended rows to spreadsheet");
        Ok(())
    }
}
