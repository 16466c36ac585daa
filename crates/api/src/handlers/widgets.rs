//! Owner CRUD for form widgets, plus their stored submissions.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::PgConnection;
use widgetry_core::config_merge::{merge_patch, update_section, Patch};
use widgetry_core::csv_export::{export_file_name, submissions_to_csv};
use widgetry_core::error::CoreError;
use widgetry_core::notification::EmailNotificationConfig;
use widgetry_core::submission::PostSubmitAction;
use widgetry_core::types::PublicId;
use widgetry_core::widget_fields::parse_schema;
use widgetry_db::models::widget::{CreatePreFill, Widget, WidgetWrite};
use widgetry_db::repositories::{
    AdminBrandInfoRepo, EmailNotificationRepo, PreFillRepo, SubmissionRepo, WidgetRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Message for unknown or foreign widgets.
pub const WIDGET_NOT_FOUND: &str = "Widget not found.";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /widgets`.
#[derive(Debug, Deserialize)]
pub struct WidgetListParams {
    /// Case-insensitive exact match on `widget_type`.
    pub widget_type: Option<String>,
}

/// One pre-fill mapping: URL parameter `parameter_name` fills `field_id`.
#[derive(Debug, Deserialize)]
pub struct PreFillInput {
    pub field_id: String,
    pub parameter_name: String,
}

/// Create/update body. Every key is optional; see [`WidgetPayload::apply`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WidgetPayload {
    pub widget_type: Patch<String>,
    pub name: Patch<String>,
    pub title: Patch<String>,
    pub description: Patch<String>,
    pub html: Patch<String>,
    pub script: Patch<String>,
    pub widget_fields: Patch<Value>,
    pub redirect_url: Patch<String>,
    pub success_msg: Patch<String>,
    pub post_submit_action: Patch<PostSubmitAction>,
    pub spam_protection: Patch<bool>,
    pub font_family: Patch<String>,
    pub title_size: Patch<String>,
    pub text_size: Patch<String>,
    pub direction: Patch<String>,
    pub default_language: Patch<String>,
    pub is_email_notification: Patch<bool>,
    pub title_style: Patch<Value>,
    pub header: Patch<Value>,
    pub display_settings: Patch<Value>,
    pub submit_button: Patch<Value>,
    pub theme: Patch<Value>,
    pub footer: Patch<Value>,
    pub user_brand_info: Patch<Value>,
    pub email_notification: Patch<Value>,
    pub pre_fill: Option<Vec<PreFillInput>>,
}

/// Row-external parts of a payload, as sent.
#[derive(Debug)]
struct RelatedInput {
    email_notification: Patch<Value>,
    pre_fill: Option<Vec<PreFillInput>>,
}

/// Row-external writes, validated and ready to run next to the widget row.
struct RelatedWrites {
    email_notification: NotificationWrite,
    pre_fill: Option<Vec<CreatePreFill>>,
}

#[derive(Debug)]
enum NotificationWrite {
    Keep,
    Remove,
    Save(EmailNotificationConfig),
}

/// Merge an `email_notification` patch into the stored settings.
fn resolve_notification(
    stored: Option<EmailNotificationConfig>,
    patch: Patch<Value>,
) -> AppResult<NotificationWrite> {
    match patch {
        Patch::Absent => Ok(NotificationWrite::Keep),
        Patch::Null => Ok(NotificationWrite::Remove),
        Patch::Value(patch) => {
            let mut merged = serde_json::to_value(stored.unwrap_or_default())
                .map_err(|e| AppError::InternalError(e.to_string()))?;
            merge_patch(&mut merged, &patch);
            let config = serde_json::from_value(merged).map_err(|e| {
                AppError::Core(CoreError::Validation(format!("Invalid email_notification: {e}")))
            })?;
            Ok(NotificationWrite::Save(config))
        }
    }
}

impl RelatedInput {
    /// Validate against the stored settings of `widget_id` (none for a
    /// new widget). Reads only.
    async fn resolve(self, state: &AppState, widget_id: Option<PublicId>) -> AppResult<RelatedWrites> {
        let stored = match (&self.email_notification, widget_id) {
            (Patch::Value(_), Some(id)) => EmailNotificationRepo::find_by_widget(&state.pool, id)
                .await?
                .map(|n| n.config()),
            _ => None,
        };
        let email_notification = resolve_notification(stored, self.email_notification)?;

        let pre_fill = self.pre_fill.map(|items| {
            items
                .into_iter()
                .map(|p| CreatePreFill {
                    field_id: p.field_id,
                    parameter_name: p.parameter_name,
                })
                .collect()
        });
        Ok(RelatedWrites {
            email_notification,
            pre_fill,
        })
    }
}

impl WidgetPayload {
    /// Resolve the payload against `target`: absent keys keep the stored
    /// value, scalars are replaced, nullable columns accept `null`, and
    /// style sections are merged key by key.
    fn apply(self, target: &mut WidgetWrite) -> AppResult<RelatedInput> {
        target.widget_type = self.widget_type.unwrap_or(std::mem::take(&mut target.widget_type));
        target.name = self.name.unwrap_or(std::mem::take(&mut target.name));
        target.title = self.title.unwrap_or(std::mem::take(&mut target.title));
        target.description = self.description.unwrap_or(std::mem::take(&mut target.description));
        target.html = self.html.unwrap_or(std::mem::take(&mut target.html));
        target.script = self.script.unwrap_or(std::mem::take(&mut target.script));
        target.widget_fields = self
            .widget_fields
            .unwrap_or(std::mem::take(&mut target.widget_fields));
        target.redirect_url = self.redirect_url.resolve(target.redirect_url.take());
        target.success_msg = self.success_msg.unwrap_or(std::mem::take(&mut target.success_msg));
        if let Patch::Value(action) = self.post_submit_action {
            target.post_submit_action = action.as_str().to_string();
        }
        target.spam_protection = self.spam_protection.unwrap_or(target.spam_protection);
        target.font_family = self.font_family.resolve(target.font_family.take());
        target.title_size = self.title_size.resolve(target.title_size.take());
        target.text_size = self.text_size.resolve(target.text_size.take());
        target.direction = self.direction.unwrap_or(std::mem::take(&mut target.direction));
        target.default_language = self
            .default_language
            .unwrap_or(std::mem::take(&mut target.default_language));
        target.is_email_notification = self
            .is_email_notification
            .unwrap_or(target.is_email_notification);

        target.title_style = update_section("title_style", target.title_style.take(), &self.title_style)?;
        target.header = update_section("header", target.header.take(), &self.header)?;
        target.display_settings = update_section(
            "display_settings",
            target.display_settings.take(),
            &self.display_settings,
        )?;
        target.submit_button =
            update_section("submit_button", target.submit_button.take(), &self.submit_button)?;
        target.theme = update_section("theme", target.theme.take(), &self.theme)?;
        target.footer = update_section("footer", target.footer.take(), &self.footer)?;
        target.user_brand_info = update_section(
            "user_brand_info",
            target.user_brand_info.take(),
            &self.user_brand_info,
        )?;

        if target.name.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation("name is required".into())));
        }
        parse_schema(&target.widget_fields)?;

        Ok(RelatedInput {
            email_notification: self.email_notification,
            pre_fill: self.pre_fill,
        })
    }
}

/// Column defaults of a new widget.
fn new_widget() -> WidgetWrite {
    WidgetWrite {
        widget_type: "contact_form".into(),
        widget_fields: json!([]),
        post_submit_action: PostSubmitAction::default().as_str().into(),
        direction: "ltr".into(),
        default_language: "en".into(),
        ..WidgetWrite::default()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/widgets
pub async fn list_widgets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<WidgetListParams>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let widget_type = params.widget_type.as_deref().filter(|t| !t.is_empty());
    let widgets = WidgetRepo::list_for_user(&state.pool, user.user_id, widget_type).await?;

    let mut data = Vec::with_capacity(widgets.len());
    for widget in &widgets {
        data.push(render_widget(&state, widget, Audience::Owner).await?);
    }
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/widgets
pub async fn create_widget(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<WidgetPayload>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    let mut write = new_widget();
    let related = payload.apply(&mut write)?.resolve(&state, None).await?;

    let mut tx = state.pool.begin().await?;
    let widget = WidgetRepo::create(&mut *tx, user.user_id, &write).await?;
    save_related(&mut tx, widget.id, related).await?;
    tx.commit().await?;

    tracing::info!(widget_id = %widget.id, user_id = user.user_id, "Widget created");
    let data = render_widget(&state, &widget, Audience::Owner).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/widgets/{id}
pub async fn get_widget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let widget = find_owned(&state, id, &user).await?;
    let data = render_widget(&state, &widget, Audience::Owner).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/widgets/{id}
///
/// Full update: `name` and `widget_fields` must be supplied.
pub async fn replace_widget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
    Json(payload): Json<WidgetPayload>,
) -> AppResult<Json<DataResponse<Value>>> {
    for (key, absent) in [
        ("name", payload.name.is_absent()),
        ("widget_fields", payload.widget_fields.is_absent()),
    ] {
        if absent {
            return Err(AppError::Core(CoreError::Validation(format!(
                "{key} is required"
            ))));
        }
    }
    update(state, user, id, payload).await
}

/// PATCH /api/v1/widgets/{id}
pub async fn update_widget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
    Json(payload): Json<WidgetPayload>,
) -> AppResult<Json<DataResponse<Value>>> {
    update(state, user, id, payload).await
}

async fn update(
    state: AppState,
    user: AuthUser,
    id: PublicId,
    payload: WidgetPayload,
) -> AppResult<Json<DataResponse<Value>>> {
    let existing = find_owned(&state, id, &user).await?;
    let mut write = WidgetWrite::from(&existing);
    let related = payload.apply(&mut write)?.resolve(&state, Some(id)).await?;

    let mut tx = state.pool.begin().await?;
    let widget = WidgetRepo::update(&mut *tx, id, &write)
        .await?
        .ok_or_else(|| AppError::NotFound(WIDGET_NOT_FOUND.into()))?;
    save_related(&mut tx, id, related).await?;
    tx.commit().await?;

    tracing::info!(widget_id = %id, "Widget updated");
    let data = render_widget(&state, &widget, Audience::Owner).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/widgets/{id}
pub async fn delete_widget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
) -> AppResult<StatusCode> {
    if !WidgetRepo::delete_owned(&state.pool, id, user.user_id).await? {
        return Err(AppError::NotFound(WIDGET_NOT_FOUND.into()));
    }
    tracing::info!(widget_id = %id, "Widget deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/widgets/{id}/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let widget = find_owned(&state, id, &user).await?;
    let submissions = SubmissionRepo::list_for_widget(&state.pool, widget.id).await?;
    Ok(Json(DataResponse {
        data: json!({
            "total_submissions": submissions.len(),
            "submissions": submissions,
        }),
    }))
}

/// GET /api/v1/widgets/{id}/submissions/download
///
/// Every submission as CSV; 404 when there is nothing to export.
pub async fn download_submissions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
) -> AppResult<impl IntoResponse> {
    let widget = find_owned(&state, id, &user).await?;
    let submissions = SubmissionRepo::list_for_widget(&state.pool, widget.id).await?;
    if submissions.is_empty() {
        return Err(AppError::NotFound("No data found.".into()));
    }

    let records: Vec<Map<String, Value>> = submissions
        .into_iter()
        .filter_map(|s| match s.data {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    let csv = submissions_to_csv(&records)?;

    let disposition = format!("attachment; filename=\"{}\"", export_file_name(&widget.id));
    Ok((
        [
            (CONTENT_TYPE, "text/csv".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Who a widget is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Owner,
    /// Embedded form visitors: notification settings are hidden.
    Public,
}

async fn find_owned(state: &AppState, id: PublicId, user: &AuthUser) -> AppResult<Widget> {
    WidgetRepo::find_owned(&state.pool, id, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(WIDGET_NOT_FOUND.into()))
}

async fn save_related(
    conn: &mut PgConnection,
    widget_id: PublicId,
    related: RelatedWrites,
) -> AppResult<()> {
    match related.email_notification {
        NotificationWrite::Keep => {}
        NotificationWrite::Remove => {
            EmailNotificationRepo::delete_for_widget(&mut *conn, widget_id).await?;
        }
        NotificationWrite::Save(config) => {
            EmailNotificationRepo::upsert(&mut *conn, widget_id, &config).await?;
        }
    }

    if let Some(items) = related.pre_fill {
        PreFillRepo::replace_for_widget(&mut *conn, widget_id, &items).await?;
    }
    Ok(())
}

/// Render a widget with its related records.
///
/// Adds `script_url`, `pre_fill_values`, `email_notification` (owners
/// only), `admin_brand_info` and `total_submissions`.
pub async fn render_widget(state: &AppState, widget: &Widget, audience: Audience) -> AppResult<Value> {
    let mut out = match serde_json::to_value(widget) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(AppError::InternalError("Widget did not serialize to an object".into())),
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };

    if let Some(owner) = out.remove("user_id") {
        out.insert("user".into(), owner);
    }

    let script_url = (!widget.script.trim().is_empty())
        .then(|| state.config.absolute_url(&format!("form-builder/script/{}.js", widget.id)));
    out.insert("script_url".into(), json!(script_url));

    let pre_fills = PreFillRepo::list_for_widget(&state.pool, widget.id).await?;
    out.insert("pre_fill_values".into(), json!(pre_fills));

    let brand = AdminBrandInfoRepo::current(&state.pool).await?.map(|b| {
        json!({
            "name": b.name,
            "logo": b.logo.as_deref().map(|logo| state.config.media_url(logo)),
            "redirect_url": b.redirect_url,
        })
    });
    out.insert("admin_brand_info".into(), json!(brand));

    let total = SubmissionRepo::count_for_widget(&state.pool, widget.id).await?;
    out.insert("total_submissions".into(), json!(total));

    match audience {
        Audience::Owner => {
            let notification = EmailNotificationRepo::find_by_widget(&state.pool, widget.id)
                .await?
                .map(|n| n.config());
            out.insert("email_notification".into(), json!(notification));
        }
        Audience::Public => {
            out.remove("is_email_notification");
        }
    }

    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn payload(value: Value) -> WidgetPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn create_applies_defaults_and_sections() {
        let mut write = new_widget();
        payload(json!({
            "name": "Contact",
            "widget_fields": [{"id": "n", "type": "text", "label": "Name"}],
            "theme": {"mode": "dark", "gradient": null}
        }))
        .apply(&mut write)
        .unwrap();

        assert_eq!(write.widget_type, "contact_form");
        assert_eq!(write.post_submit_action, "success_msg");
        assert_eq!(write.theme, Some(json!({"mode": "dark"})));
        assert_eq!(write.header, None);
    }

    #[test]
    fn update_keeps_absent_and_clears_null() {
        let mut write = new_widget();
        write.name = "Old".into();
        write.redirect_url = Some("https://a.io".into());
        write.footer = Some(json!({"text": "bye"}));
        write.submit_button = Some(json!({"text": "Send", "colors": {"bg": "#000", "fg": "#fff"}}));

        payload(json!({
            "redirect_url": null,
            "footer": null,
            "submit_button": {"colors": {"bg": "#f00"}},
            "post_submit_action": "hide_form"
        }))
        .apply(&mut write)
        .unwrap();

        assert_eq!(write.name, "Old");
        assert_eq!(write.redirect_url, None);
        assert_eq!(write.footer, None);
        assert_eq!(
            write.submit_button,
            Some(json!({"text": "Send", "colors": {"bg": "#f00", "fg": "#fff"}}))
        );
        assert_eq!(write.post_submit_action, "hide_form");
    }

    #[test]
    fn invalid_schema_is_rejected() {
        let mut write = new_widget();
        let err = payload(json!({
            "name": "Dupes",
            "widget_fields": [
                {"id": "a", "type": "text", "label": "A"},
                {"id": "a", "type": "text", "label": "B"}
            ]
        }))
        .apply(&mut write)
        .unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::Validation(_)));
    }

    #[test]
    fn name_is_required() {
        let mut write = new_widget();
        assert_matches!(
            payload(json!({})).apply(&mut write),
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn notification_patch_merges_into_stored_settings() {
        let stored = EmailNotificationConfig {
            subject: "New lead".into(),
            ..EmailNotificationConfig::default()
        };
        let write = resolve_notification(Some(stored), Patch::Value(json!({"sender_name": "Acme"})))
            .unwrap();
        assert_matches!(write, NotificationWrite::Save(config) => {
            assert_eq!(config.subject, "New lead");
            assert_eq!(config.sender_name, "Acme");
        });
    }

    #[test]
    fn malformed_notification_is_rejected_before_writing() {
        assert_matches!(
            resolve_notification(None, Patch::Value(json!({"email": "not-a-list"}))),
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_matches!(resolve_notification(None, Patch::Null), Ok(NotificationWrite::Remove));
        assert_matches!(resolve_notification(None, Patch::Absent), Ok(NotificationWrite::Keep));
    }

    #[test]
    fn null_for_non_nullable_scalar_keeps_value() {
        let mut write = new_widget();
        write.name = "Kept".into();
        payload(json!({"name": null, "spam_protection": true}))
            .apply(&mut write)
            .unwrap();
        assert_eq!(write.name, "Kept");
        assert!(write.spam_protection);
    }
}
