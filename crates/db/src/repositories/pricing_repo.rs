//! Repositories for pricing containers and their columns.

use serde_json::Value;
use sqlx::{PgExecutor, PgPool};
use widgetry_core::types::{DbId, PublicId};

use crate::models::pricing::{PricingColumn, PricingContainer, PricingContainerWrite};

const COLUMNS: &str = "id, user_id, title, layout, appearance, sheet_id, created_at, updated_at";

const COLUMN_COLUMNS: &str = "id, container_id, position, body, created_at, updated_at";

/// Pricing table containers.
pub struct PricingContainerRepo;

impl PricingContainerRepo {
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        input: &PricingContainerWrite,
    ) -> Result<PricingContainer, sqlx::Error> {
        let query = format!(
            "INSERT INTO pricing_containers (id, user_id, title, layout, appearance)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PricingContainer>(&query)
            .bind(uuid::Uuid::new_v4())
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.layout)
            .bind(&input.appearance)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: PublicId,
    ) -> Result<Option<PricingContainer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pricing_containers WHERE id = $1");
        sqlx::query_as::<_, PricingContainer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_owned(
        pool: &PgPool,
        id: PublicId,
        user_id: DbId,
    ) -> Result<Option<PricingContainer>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM pricing_containers WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, PricingContainer>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PricingContainer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pricing_containers WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, PricingContainer>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: PublicId,
        input: &PricingContainerWrite,
    ) -> Result<Option<PricingContainer>, sqlx::Error> {
        let query = format!(
            "UPDATE pricing_containers SET title = $2, layout = $3, appearance = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PricingContainer>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.layout)
            .bind(&input.appearance)
            .fetch_optional(executor)
            .await
    }

    pub async fn delete_owned(
        pool: &PgPool,
        id: PublicId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pricing_containers WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Ordered columns of a pricing container.
pub struct PricingColumnRepo;

impl PricingColumnRepo {
    pub async fn list_for_container(
        pool: &PgPool,
        container_id: PublicId,
    ) -> Result<Vec<PricingColumn>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMN_COLUMNS} FROM pricing_columns
             WHERE container_id = $1 ORDER BY position, id"
        );
        sqlx::query_as::<_, PricingColumn>(&query)
            .bind(container_id)
            .fetch_all(pool)
            .await
    }

    /// Append a column after the container's current last position.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        container_id: PublicId,
        body: &Value,
    ) -> Result<PricingColumn, sqlx::Error> {
        let query = format!(
            "INSERT INTO pricing_columns (container_id, position, body)
             VALUES ($1,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM pricing_columns WHERE container_id = $1),
                $2)
             RETURNING {COLUMN_COLUMNS}"
        );
        sqlx::query_as::<_, PricingColumn>(&query)
            .bind(container_id)
            .bind(body)
            .fetch_one(executor)
            .await
    }

    /// Replace a column body. Scoped to the container so foreign ids miss.
    pub async fn update_body<'e>(
        executor: impl PgExecutor<'e>,
        container_id: PublicId,
        id: DbId,
        body: &Value,
    ) -> Result<Option<PricingColumn>, sqlx::Error> {
        let query = format!(
            "UPDATE pricing_columns SET body = $3
             WHERE id = $1 AND container_id = $2
             RETURNING {COLUMN_COLUMNS}"
        );
        sqlx::query_as::<_, PricingColumn>(&query)
            .bind(id)
            .bind(container_id)
            .bind(body)
            .fetch_optional(executor)
            .await
    }

    pub async fn delete<'e>(
        executor: impl PgExecutor<'e>,
        container_id: PublicId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pricing_columns WHERE id = $1 AND container_id = $2")
            .bind(id)
            .bind(container_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
