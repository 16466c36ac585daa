//! Files written under the media root.
//!
//! Stored names are random so uploads never collide or escape their
//! directory; only the original extension survives.

use std::path::Path;

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Subdirectory for files uploaded through form `file` fields.
pub const WIDGET_FILES_DIR: &str = "widget_files";

/// Subdirectory for standalone image uploads.
pub const IMAGE_UPLOADS_DIR: &str = "uploads";

/// Extensions accepted by the image upload endpoint.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

/// Lowercased extension of an uploaded file name, if it has a sane one.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

/// Reject files whose extension is not an accepted image type.
pub fn ensure_image(file_name: &str) -> AppResult<()> {
    match extension_of(file_name) {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(AppError::BadRequest(format!(
            "Unsupported image type. Allowed: {}",
            IMAGE_EXTENSIONS.join(", ")
        ))),
    }
}

/// Relative path (`<dir>/<random>.<ext>`) for a new upload.
pub fn new_relative_path(dir: &str, original_name: &str) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    match extension_of(original_name) {
        Some(ext) => format!("{dir}/{stem}.{ext}"),
        None => format!("{dir}/{stem}"),
    }
}

/// Write `data` under `media_root` and return its relative path.
pub async fn store(
    media_root: &Path,
    dir: &str,
    original_name: &str,
    data: &[u8],
) -> AppResult<String> {
    let relative = new_relative_path(dir, original_name);
    let target = media_root.join(&relative);

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AppError::InternalError(format!("Failed to create media directory: {e}"))
        })?;
    }
    tokio::fs::write(&target, data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;

    tracing::debug!(path = %relative, bytes = data.len(), "Stored upload");
    Ok(relative)
}
