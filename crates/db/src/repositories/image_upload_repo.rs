//! Repository for `image_uploads`.

use sqlx::PgPool;

use crate::models::image_upload::ImageUpload;

pub struct ImageUploadRepo;

impl ImageUploadRepo {
    pub async fn create(pool: &PgPool, file_path: &str) -> Result<ImageUpload, sqlx::Error> {
        sqlx::query_as::<_, ImageUpload>(
            "INSERT INTO image_uploads (file_path) VALUES ($1) RETURNING id, file_path, created_at",
        )
        .bind(file_path)
        .fetch_one(pool)
        .await
    }
}
