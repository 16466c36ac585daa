//! Starter templates for the form builder. Readable by anyone, managed by
//! admins.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use widgetry_core::config_merge::{update_section, Patch};
use widgetry_core::error::CoreError;
use widgetry_core::types::DbId;
use widgetry_db::models::form_template::{FormTemplate, FormTemplateWrite};
use widgetry_db::repositories::FormTemplateRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Create/update body; absent keys keep stored values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FormTemplatePayload {
    pub image: Patch<String>,
    pub fields: Patch<Value>,
    pub header_enabled: Patch<bool>,
    pub header_title: Patch<String>,
    pub header_caption: Patch<String>,
    pub submit_button: Patch<Value>,
    pub footer: Patch<String>,
    pub embed_type: Patch<String>,
    pub color_scheme: Patch<String>,
    pub accent_color: Patch<String>,
    pub bg_color: Patch<String>,
}

impl FormTemplatePayload {
    fn apply(self, target: &mut FormTemplateWrite) -> AppResult<()> {
        target.image = self.image.resolve(target.image.take());
        target.fields = self.fields.unwrap_or(std::mem::take(&mut target.fields));
        target.header_enabled = self.header_enabled.unwrap_or(target.header_enabled);
        target.header_title = self.header_title.unwrap_or(std::mem::take(&mut target.header_title));
        target.header_caption = self
            .header_caption
            .unwrap_or(std::mem::take(&mut target.header_caption));
        target.submit_button =
            update_section("submit_button", target.submit_button.take(), &self.submit_button)?;
        target.footer = self.footer.unwrap_or(std::mem::take(&mut target.footer));
        target.embed_type = self.embed_type.unwrap_or(std::mem::take(&mut target.embed_type));
        target.color_scheme = self.color_scheme.unwrap_or(std::mem::take(&mut target.color_scheme));
        target.accent_color = self.accent_color.unwrap_or(std::mem::take(&mut target.accent_color));
        target.bg_color = self.bg_color.unwrap_or(std::mem::take(&mut target.bg_color));

        if !target.fields.is_array() {
            return Err(AppError::Core(CoreError::Validation(
                "fields must be a list".into(),
            )));
        }
        Ok(())
    }
}

fn render(state: &AppState, template: &FormTemplate) -> AppResult<Value> {
    let mut value =
        serde_json::to_value(template).map_err(|e| AppError::InternalError(e.to_string()))?;
    if let Some(image) = template.image.as_deref() {
        value["image"] = json!(state.config.media_url(image));
    }
    Ok(value)
}

async fn find(state: &AppState, id: DbId) -> AppResult<FormTemplate> {
    FormTemplateRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("FormTemplate", id)))
}

/// GET /api/v1/form-templates
pub async fn list_templates(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let templates = FormTemplateRepo::list(&state.pool).await?;
    let data = templates
        .iter()
        .map(|t| render(&state, t))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/form-templates/{id}
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let template = find(&state, id).await?;
    Ok(Json(DataResponse {
        data: render(&state, &template)?,
    }))
}

/// POST /api/v1/form-templates (admin only)
pub async fn create_template(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<FormTemplatePayload>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    let mut write = FormTemplateWrite {
        fields: json!([]),
        header_enabled: true,
        ..FormTemplateWrite::default()
    };
    payload.apply(&mut write)?;

    let template = FormTemplateRepo::create(&state.pool, &write).await?;
    tracing::info!(template_id = template.id, admin_id = admin.user_id, "Form template created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: render(&state, &template)?,
        }),
    ))
}

/// PUT/PATCH /api/v1/form-templates/{id} (admin only)
pub async fn update_template(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(payload): Json<FormTemplatePayload>,
) -> AppResult<Json<DataResponse<Value>>> {
    let existing = find(&state, id).await?;
    let mut write = FormTemplateWrite::from(&existing);
    payload.apply(&mut write)?;

    let template = FormTemplateRepo::update(&state.pool, id, &write)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("FormTemplate", id)))?;
    Ok(Json(DataResponse {
        data: render(&state, &template)?,
    }))
}

/// DELETE /api/v1/form-templates/{id} (admin only)
pub async fn delete_template(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !FormTemplateRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::not_found("FormTemplate", id)));
    }
    tracing::info!(template_id = id, admin_id = admin.user_id, "Form template deleted");
    Ok(StatusCode::NO_CONTENT)
}
