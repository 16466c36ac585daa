//! Endpoints used by embedded forms: widget fetch, script and submission.

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{Map, Value};
use widgetry_core::notification::{auto_response, owner_notification};
use widgetry_core::submission::{
    process_fields, PostSubmitAction, SubmissionInput, SubmitOutcome, RECAPTCHA_TOKEN_FIELD,
};
use widgetry_core::types::PublicId;
use widgetry_core::widget_fields::parse_schema;
use widgetry_db::models::submission::CreateWidgetFile;
use widgetry_db::models::widget::Widget;
use widgetry_db::repositories::{
    EmailNotificationRepo, SubmissionRepo, UserRepo, WidgetFileRepo, WidgetRepo,
};
use widgetry_events::{SheetTarget, Task};

use crate::error::{AppError, AppResult};
use crate::handlers::widgets::{render_widget, Audience, WIDGET_NOT_FOUND};
use crate::media::{self, WIDGET_FILES_DIR};
use crate::response::DataResponse;
use crate::state::AppState;

/// A file received in a multipart submission.
#[derive(Debug)]
struct Upload {
    file_name: String,
    data: Vec<u8>,
}

async fn find_widget(state: &AppState, id: PublicId) -> AppResult<Widget> {
    WidgetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(WIDGET_NOT_FOUND.into()))
}

/// GET /api/v1/public/widgets/{id}
pub async fn get_public_widget(
    State(state): State<AppState>,
    Path(id): Path<PublicId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let widget = find_widget(&state, id).await?;
    let data = render_widget(&state, &widget, Audience::Public).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /form-builder/script/{file}
///
/// `file` is `<widget id>.js`; answers the stored script as JavaScript.
pub async fn widget_script(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = file
        .strip_suffix(".js")
        .and_then(|raw| raw.parse::<PublicId>().ok())
        .ok_or_else(|| AppError::NotFound(WIDGET_NOT_FOUND.into()))?;
    let widget = find_widget(&state, id).await?;
    Ok(([(CONTENT_TYPE, "application/javascript")], widget.script))
}

/// POST /api/v1/public/widgets/{id}/submit
///
/// Accepts a JSON object or a multipart form. Answers the widget's
/// post-submit action.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<PublicId>,
    request: Request,
) -> AppResult<Json<SubmitOutcome>> {
    let widget = find_widget(&state, id).await?;

    let (mut input, uploads) = read_submission(&state, request).await?;

    if widget.spam_protection {
        verify_recaptcha(&state, input.value(RECAPTCHA_TOKEN_FIELD)).await?;
    }

    input.uploads = uploads
        .iter()
        .filter(|(_, files)| !files.is_empty())
        .map(|(field, _)| field.clone())
        .collect();

    let schema = parse_schema(&widget.widget_fields)?;
    let mut processed = process_fields(&schema, &input).map_err(AppError::FieldErrors)?;

    let pending: Vec<String> = processed.pending_uploads().map(str::to_string).collect();
    for field_id in pending {
        let mut urls = Vec::new();
        for upload in uploads.get(&field_id).into_iter().flatten() {
            let path =
                media::store(&state.config.media_root, WIDGET_FILES_DIR, &upload.file_name, &upload.data)
                    .await?;
            WidgetFileRepo::create(
                &state.pool,
                &CreateWidgetFile {
                    widget_id: widget.id,
                    file_path: path.clone(),
                    original_name: upload.file_name.clone(),
                },
            )
            .await?;
            urls.push(state.config.media_url(&path));
        }
        processed.attach_upload(&field_id, urls.join(", "));
    }

    SubmissionRepo::create(&state.pool, widget.id, &processed.to_record()).await?;

    let owner = UserRepo::find_by_id(&state.pool, widget.user_id).await?;
    if let Some(owner) = &owner {
        if owner.is_oauth {
            state.tasks.dispatch(Task::AppendToSheet {
                target: SheetTarget::FormWidget(widget.id),
                values: processed.sheet_values(),
                header: processed.sheet_header(),
            });
        }
    }

    if let Some(notification) = EmailNotificationRepo::find_by_widget(&state.pool, widget.id).await? {
        let config = notification.config();
        let owner_email = owner.as_ref().map(|o| o.email.as_str()).unwrap_or_default();
        if let Some(message) = auto_response(&config, &processed, owner_email) {
            state.tasks.dispatch(Task::SendEmail(message));
        }
        if widget.is_email_notification {
            if let Some(message) = owner_notification(&config, &processed) {
                state.tasks.dispatch(Task::SendEmail(message));
            }
        }
    }

    tracing::info!(widget_id = %widget.id, fields = processed.fields.len(), "Submission accepted");

    Ok(Json(SubmitOutcome::for_action(
        PostSubmitAction::parse(&widget.post_submit_action),
        &widget.success_msg,
        widget.redirect_url.as_deref(),
    )))
}

/// Split a request into text values and uploaded files per field.
async fn read_submission(
    state: &AppState,
    request: Request,
) -> AppResult<(SubmissionInput, HashMap<String, Vec<Upload>>)> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(body) = Json::<Map<String, Value>>::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok((SubmissionInput::from_json(&body), HashMap::new()));
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut input = SubmissionInput::default();
    let mut uploads: HashMap<String, Vec<Upload>> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !data.is_empty() {
                    uploads.entry(name).or_default().push(Upload {
                        file_name,
                        data: data.to_vec(),
                    });
                }
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                input.values.insert(name, text);
            }
        }
    }

    Ok((input, uploads))
}

async fn verify_recaptcha(state: &AppState, token: Option<&str>) -> AppResult<()> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing reCAPTCHA token".into()))?;

    let Some(recaptcha) = &state.recaptcha else {
        tracing::error!("Spam-protected form submitted but RECAPTCHA_SECRET_KEY is not set");
        return Err(AppError::BadRequest("Invalid reCAPTCHA token".into()));
    };

    match recaptcha.verify(token).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::BadRequest("Invalid reCAPTCHA token".into())),
        Err(e) => {
            tracing::warn!(error = %e, "reCAPTCHA verification request failed");
            Err(AppError::BadRequest("Invalid reCAPTCHA token".into()))
        }
    }
}
