use widgetry_core::error::CoreError;
use widgetry_google::GoogleError;

use crate::delivery::email::EmailError;

/// Failure of a single background task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Google(#[from] GoogleError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
