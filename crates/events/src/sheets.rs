//! Spreadsheet writes for form submissions and bookings.

use widgetry_core::types::{DbId, PublicId};
use widgetry_db::repositories::{AppointmentWidgetRepo, WidgetRepo};
use widgetry_db::DbPool;
use widgetry_google::SheetsClient;

use crate::credentials::CredentialStore;
use crate::error::TaskError;
use crate::queue::SheetTarget;

/// Title given to a new spreadsheet when the widget has no name.
pub const FALLBACK_SHEET_TITLE: &str = "Widget-Form-Data";

/// What a sheet write needs to know about its target.
struct TargetInfo {
    owner_id: DbId,
    title: String,
    sheet_id: Option<String>,
}

/// Appends rows to the spreadsheet linked to a widget.
#[derive(Debug, Clone)]
pub struct SheetWriter {
    pool: DbPool,
    credentials: CredentialStore,
    sheets: SheetsClient,
}

impl SheetWriter {
    pub fn new(pool: DbPool, credentials: CredentialStore, sheets: SheetsClient) -> Self {
        Self {
            pool,
            credentials,
            sheets,
        }
    }

    /// Append `values` to the target's spreadsheet.
    ///
    /// Without a linked spreadsheet a new one is created, seeded with
    /// `header` and `values`, and linked to the target. Deleted targets and
    /// owners without Google credentials are skipped.
    pub async fn append(
        &self,
        target: SheetTarget,
        values: Vec<String>,
        header: Vec<String>,
    ) -> Result<(), TaskError> {
        let Some(info) = self.load_target(target).await? else {
            tracing::debug!(?target, "Sheet target no longer exists, skipping");
            return Ok(());
        };
        let Some(access_token) = self.credentials.access_token(info.owner_id).await? else {
            tracing::debug!(user_id = info.owner_id, "No Google credentials, skipping sheet write");
            return Ok(());
        };

        match info.sheet_id {
            Some(sheet_id) => {
                self.sheets
                    .append_rows(&access_token, &sheet_id, &[values])
                    .await?;
            }
            None => {
                let title = if info.title.trim().is_empty() {
                    FALLBACK_SHEET_TITLE
                } else {
                    info.title.as_str()
                };
                let sheet_id = self.sheets.create_spreadsheet(&access_token, title).await?;
                self.sheets
                    .append_rows(&access_token, &sheet_id, &[header, values])
                    .await?;
                self.link_sheet(target, &sheet_id).await?;
            }
        }
        Ok(())
    }

    async fn load_target(&self, target: SheetTarget) -> Result<Option<TargetInfo>, TaskError> {
        let info = match target {
            SheetTarget::FormWidget(id) => {
                WidgetRepo::find_by_id(&self.pool, id).await?.map(|w| TargetInfo {
                    owner_id: w.user_id,
                    title: w.name,
                    sheet_id: w.sheet_id,
                })
            }
            SheetTarget::AppointmentWidget(id) => AppointmentWidgetRepo::find_by_id(&self.pool, id)
                .await?
                .map(|w| TargetInfo {
                    owner_id: w.user_id,
                    title: w.name,
                    sheet_id: w.sheet_id,
                }),
        };
        Ok(info)
    }

    async fn link_sheet(&self, target: SheetTarget, sheet_id: &str) -> Result<(), TaskError> {
        let id: PublicId = match target {
            SheetTarget::FormWidget(id) => {
                WidgetRepo::set_sheet_id(&self.pool, id, sheet_id).await?;
                id
            }
            SheetTarget::AppointmentWidget(id) => {
                AppointmentWidgetRepo::set_sheet_id(&self.pool, id, sheet_id).await?;
                id
            }
        };
        tracing::info!(target_id = %id, sheet_id, "Linked new spreadsheet");
        Ok(())
    }
}
