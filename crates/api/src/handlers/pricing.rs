//! Pricing tables: owner CRUD of containers and their columns, plus the
//! public view used by the embed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::PgConnection;
use widgetry_core::config_merge::{update_section, Patch};
use widgetry_core::error::CoreError;
use widgetry_core::pricing::{apply_column_update, classify_column_patches, ColumnOp, LayoutFlags};
use widgetry_core::types::{DbId, PublicId};
use widgetry_db::models::pricing::{PricingColumn, PricingContainer, PricingContainerWrite};
use widgetry_db::repositories::{PricingColumnRepo, PricingContainerRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const CONTAINER_NOT_FOUND: &str = "Pricing widget not found.";

/// Styling groups every container's `appearance` carries.
const APPEARANCE_SECTIONS: [&str; 4] = ["title", "feature", "price", "button"];

/// Create/update body for a container.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContainerPayload {
    pub title: Patch<String>,
    pub layout: Patch<Value>,
    pub appearance: Patch<Value>,
    /// Column changes; see [`classify_column_patches`].
    pub content: Option<Vec<Value>>,
}

impl ContainerPayload {
    /// Resolve the container columns and classify the column changes.
    ///
    /// `layout` and `appearance` are merged into the stored documents; a
    /// `null` resets them.
    fn apply(self, target: &mut PricingContainerWrite) -> AppResult<Vec<ColumnOp>> {
        target.title = self.title.unwrap_or(std::mem::take(&mut target.title));
        target.layout = update_section("layout", Some(std::mem::take(&mut target.layout)), &self.layout)?
            .unwrap_or_else(|| json!({}));
        let appearance = update_section(
            "appearance",
            Some(std::mem::take(&mut target.appearance)),
            &self.appearance,
        )?;
        target.appearance = with_appearance_sections(appearance.unwrap_or_else(|| json!({})));

        if target.title.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation("title is required".into())));
        }
        for section in APPEARANCE_SECTIONS {
            if !target.appearance[section].is_object() {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "appearance.{section} must be a JSON object"
                ))));
            }
        }

        Ok(classify_column_patches(self.content.as_deref().unwrap_or_default())?)
    }
}

/// Fill in missing appearance groups with empty objects.
fn with_appearance_sections(mut appearance: Value) -> Value {
    if let Value::Object(map) = &mut appearance {
        for section in APPEARANCE_SECTIONS {
            map.entry(section).or_insert_with(|| json!({}));
        }
    }
    appearance
}

fn write_from(container: &PricingContainer) -> PricingContainerWrite {
    PricingContainerWrite {
        title: container.title.clone(),
        layout: container.layout.clone(),
        appearance: container.appearance.clone(),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/pricing/containers
pub async fn list_containers(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let containers = PricingContainerRepo::list_for_user(&state.pool, user.user_id).await?;
    let mut data = Vec::with_capacity(containers.len());
    for container in &containers {
        data.push(render_owned(&state, container).await?);
    }
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/pricing/containers
pub async fn create_container(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ContainerPayload>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    if payload.title.is_absent() {
        return Err(AppError::Core(CoreError::Validation("title is required".into())));
    }

    let mut write = PricingContainerWrite {
        title: String::new(),
        layout: json!({}),
        appearance: json!({}),
    };
    let ops = payload.apply(&mut write)?;

    let mut columns = Vec::with_capacity(ops.len());
    for op in ops {
        match op {
            ColumnOp::Create(fields) => columns.push(Value::Object(fields)),
            ColumnOp::Delete(id) | ColumnOp::Update(id, _) => {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "content of a new pricing widget cannot reference column {id}"
                ))));
            }
        }
    }

    let mut tx = state.pool.begin().await?;
    let container = PricingContainerRepo::create(&mut *tx, user.user_id, &write).await?;
    for body in &columns {
        PricingColumnRepo::create(&mut *tx, container.id, body).await?;
    }
    tx.commit().await?;

    tracing::info!(
        container_id = %container.id,
        user_id = user.user_id,
        columns = columns.len(),
        "Pricing widget created"
    );
    let data = render_owned(&state, &container).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/pricing/containers/{id}
pub async fn get_container(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let container = find_owned(&state, id, &user).await?;
    let data = render_owned(&state, &container).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT/PATCH /api/v1/pricing/containers/{id}
pub async fn update_container(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
    Json(payload): Json<ContainerPayload>,
) -> AppResult<Json<DataResponse<Value>>> {
    let existing = find_owned(&state, id, &user).await?;
    let mut write = write_from(&existing);
    let ops = payload.apply(&mut write)?;
    let columns = PricingColumnRepo::list_for_container(&state.pool, id).await?;
    let writes = plan_column_writes(&columns, ops)?;

    let mut tx = state.pool.begin().await?;
    let container = PricingContainerRepo::update(&mut *tx, id, &write)
        .await?
        .ok_or_else(|| AppError::NotFound(CONTAINER_NOT_FOUND.into()))?;
    apply_column_writes(&mut tx, id, writes).await?;
    tx.commit().await?;

    tracing::info!(container_id = %id, "Pricing widget updated");
    let data = render_owned(&state, &container).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/pricing/containers/{id}
pub async fn delete_container(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
) -> AppResult<StatusCode> {
    if !PricingContainerRepo::delete_owned(&state.pool, id, user.user_id).await? {
        return Err(AppError::NotFound(CONTAINER_NOT_FOUND.into()));
    }
    tracing::info!(container_id = %id, "Pricing widget deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/pricing/{id}
///
/// The embed view: container and column ids and the layout are hidden,
/// and column parts switched off by the layout are removed.
pub async fn get_public_pricing(
    State(state): State<AppState>,
    Path(id): Path<PublicId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let container = PricingContainerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(CONTAINER_NOT_FOUND.into()))?;
    let columns = PricingColumnRepo::list_for_container(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: render_public(&container, &columns)?,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_owned(state: &AppState, id: PublicId, user: &AuthUser) -> AppResult<PricingContainer> {
    PricingContainerRepo::find_owned(&state.pool, id, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(CONTAINER_NOT_FOUND.into()))
}

/// A column change with its final body resolved.
#[derive(Debug)]
enum ColumnWrite {
    Delete(DbId),
    Update(DbId, Value),
    Create(Value),
}

/// Resolve column changes against the stored columns before anything is
/// written.
///
/// Deleting a column that no longer exists is a no-op; updating one is
/// a 404.
fn plan_column_writes(columns: &[PricingColumn], ops: Vec<ColumnOp>) -> AppResult<Vec<ColumnWrite>> {
    ops.into_iter()
        .map(|op| match op {
            ColumnOp::Delete(column_id) => Ok(ColumnWrite::Delete(column_id)),
            ColumnOp::Update(column_id, fields) => {
                let mut body = columns
                    .iter()
                    .find(|c| c.id == column_id)
                    .map(|c| c.body.clone())
                    .ok_or_else(|| column_not_found(column_id))?;
                apply_column_update(&mut body, &fields);
                Ok(ColumnWrite::Update(column_id, body))
            }
            ColumnOp::Create(fields) => Ok(ColumnWrite::Create(Value::Object(fields))),
        })
        .collect()
}

fn column_not_found(column_id: DbId) -> AppError {
    AppError::NotFound(format!("Column {column_id} not found."))
}

/// Run planned column writes in request order on `conn`.
async fn apply_column_writes(
    conn: &mut PgConnection,
    container_id: PublicId,
    writes: Vec<ColumnWrite>,
) -> AppResult<()> {
    for write in writes {
        match write {
            ColumnWrite::Delete(column_id) => {
                if !PricingColumnRepo::delete(&mut *conn, container_id, column_id).await? {
                    tracing::debug!(%container_id, column_id, "Column already gone");
                }
            }
            ColumnWrite::Update(column_id, body) => {
                PricingColumnRepo::update_body(&mut *conn, container_id, column_id, &body)
                    .await?
                    .ok_or_else(|| column_not_found(column_id))?;
            }
            ColumnWrite::Create(body) => {
                PricingColumnRepo::create(&mut *conn, container_id, &body).await?;
            }
        }
    }
    Ok(())
}

fn container_map(container: &PricingContainer) -> AppResult<Map<String, Value>> {
    match serde_json::to_value(container) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::InternalError("Container did not serialize to an object".into())),
        Err(e) => Err(AppError::InternalError(e.to_string())),
    }
}

async fn render_owned(state: &AppState, container: &PricingContainer) -> AppResult<Value> {
    let columns = PricingColumnRepo::list_for_container(&state.pool, container.id).await?;
    let mut out = container_map(container)?;
    let content: Vec<Value> = columns.iter().map(|c| Value::Object(c.to_json())).collect();
    out.insert("content".into(), Value::Array(content));
    Ok(Value::Object(out))
}

fn render_public(container: &PricingContainer, columns: &[PricingColumn]) -> AppResult<Value> {
    let flags = LayoutFlags::from_layout(Some(&container.layout));
    let mut out = container_map(container)?;
    for key in ["id", "user_id", "layout", "sheet_id"] {
        out.remove(key);
    }

    let content: Vec<Value> = columns
        .iter()
        .map(|column| {
            let mut body = column.to_json();
            body.remove("id");
            flags.apply(&mut body);
            Value::Object(body)
        })
        .collect();
    out.insert("content".into(), Value::Array(content));
    Ok(Value::Object(out))
}
