//! Standalone image uploads used by the builder (logos, covers, pictures).

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use widgetry_core::types::DbId;
use widgetry_db::repositories::ImageUploadRepo;

use crate::error::{AppError, AppResult};
use crate::media::{self, IMAGE_UPLOADS_DIR};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the file.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub id: DbId,
    /// Absolute URL of the stored file.
    pub url: String,
}

/// POST /api/v1/uploads/images
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<ImageUploadResponse>>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("The image field must carry a file".into()))?;
        media::ensure_image(&file_name)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded image is empty".into()));
        }

        let path = media::store(&state.config.media_root, IMAGE_UPLOADS_DIR, &file_name, &data).await?;
        let upload = ImageUploadRepo::create(&state.pool, &path).await?;

        tracing::info!(upload_id = upload.id, user_id = user.user_id, path = %path, "Image uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(DataResponse {
                data: ImageUploadResponse {
                    id: upload.id,
                    url: state.config.media_url(&upload.file_path),
                },
            }),
        ));
    }

    Err(AppError::BadRequest("Missing 'image' file field".into()))
}
