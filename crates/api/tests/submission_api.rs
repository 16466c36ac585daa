//! Integration tests for the public form endpoints: widget fetch,
//! submission (JSON and multipart), queued side effects and CSV export.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{
    access_token, body_json, body_text, drain_tasks, get, get_auth, post_json, post_json_auth,
    post_multipart,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use widgetry_db::repositories::UserRepo;
use widgetry_events::{SheetTarget, Task};

fn lead_form() -> Value {
    json!({
        "name": "Leads",
        "success_msg": "Thanks!",
        "is_email_notification": true,
        "widget_fields": [
            {"id": "name", "type": "text", "label": "Name", "required": true},
            {"id": "mail", "type": "email", "label": "Email"},
            {"id": "terms", "type": "consent", "label": "Terms", "required": true}
        ],
        "email_notification": {
            "auto_responder_email": true,
            "response_subject": "We got it",
            "response_message": "Talk soon",
            "subject": "New lead",
            "message": "Someone wrote:",
            "email": ["owner@example.com"]
        }
    })
}

async fn create_widget(app: axum::Router, token: &str, body: Value) -> String {
    let response = post_json_auth(app, "/api/v1/widgets", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn public_widget_hides_notification_settings(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let id = create_widget(app.clone(), &token, lead_form()).await;

    let response = get(app, &format!("/api/v1/public/widgets/{id}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["name"], "Leads");
    assert!(data.get("email_notification").is_none());
    assert!(data.get("is_email_notification").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_public_widget_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(
        app,
        &format!("/api/v1/public/widgets/{}", uuid::Uuid::new_v4()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn json_submission_is_stored_and_notifies(pool: PgPool) {
    let (app, mut tasks) = common::build_test_app_with_tasks(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let id = create_widget(app.clone(), &token, lead_form()).await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/public/widgets/{id}/submit"),
        json!({"name": " Ada ", "mail": "ada@example.com", "terms": true}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"action": "success_msg", "value": "Thanks!"})
    );

    let response = get_auth(app, &format!("/api/v1/widgets/{id}/submissions"), &token).await;
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["total_submissions"], 1);
    assert_eq!(data["submissions"][0]["data"], json!({"Name": "Ada", "Email": "ada@example.com"}));

    let queued = drain_tasks(&mut tasks);
    assert_eq!(queued.len(), 2, "auto-response and owner notification");
    assert_matches!(&queued[0], Task::SendEmail(m) if m.to == vec!["ada@example.com".to_string()]);
    assert_matches!(
        &queued[1],
        Task::SendEmail(m) if m.subject == "New lead" && m.body.contains("Name: Ada")
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_required_fields_are_reported_by_label(pool: PgPool) {
    let (app, mut tasks) = common::build_test_app_with_tasks(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let id = create_widget(app.clone(), &token, lead_form()).await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/public/widgets/{id}/submit"),
        json!({"mail": "ada@example.com", "terms": "false"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["errors"]["Name"], "Name is required.");
    assert_eq!(json["errors"]["Terms"], "Terms is required.");
    assert!(drain_tasks(&mut tasks).is_empty());

    let response = get_auth(app, &format!("/api/v1/widgets/{id}/submissions"), &token).await;
    assert_eq!(body_json(response).await["data"]["total_submissions"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn oauth_owner_gets_a_sheet_row(pool: PgPool) {
    let (app, mut tasks) = common::build_test_app_with_tasks(pool.clone());
    let login = common::register_and_login(app.clone(), "owner@example.com").await;
    let token = login["access_token"].as_str().unwrap();
    UserRepo::set_oauth(&pool, login["user"]["id"].as_i64().unwrap())
        .await
        .unwrap();
    let mut form = lead_form();
    form["email_notification"] = Value::Null;
    let id = create_widget(app.clone(), token, form).await;

    post_json(
        app,
        &format!("/api/v1/public/widgets/{id}/submit"),
        json!({"name": "Ada", "mail": "ada@example.com", "terms": "true"}),
    )
    .await;

    let queued = drain_tasks(&mut tasks);
    assert_eq!(queued.len(), 1);
    assert_matches!(
        &queued[0],
        Task::AppendToSheet { target: SheetTarget::FormWidget(_), values, header }
            if values == &vec!["Ada".to_string(), "ada@example.com".to_string()]
                && header == &vec!["name".to_string(), "email".to_string()]
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn spam_protected_form_requires_recaptcha_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let mut form = lead_form();
    form["spam_protection"] = json!(true);
    let id = create_widget(app.clone(), &token, form).await;
    let uri = format!("/api/v1/public/widgets/{id}/submit");

    let response = post_json(app.clone(), &uri, json!({"name": "Ada", "terms": true})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Missing reCAPTCHA token");

    // No secret configured: every token is rejected.
    let response = post_json(
        app,
        &uri,
        json!({"name": "Ada", "terms": true, "recaptchaToken": "tok"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid reCAPTCHA token");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn multipart_submission_stores_uploaded_file(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let id = create_widget(
        app.clone(),
        &token,
        json!({
            "name": "Applications",
            "post_submit_action": "redirect_url",
            "redirect_url": "https://example.com/thanks",
            "widget_fields": [
                {"id": "name", "type": "text", "label": "Name", "required": true},
                {"id": "cv", "type": "file", "label": "CV", "required": true}
            ]
        }),
    )
    .await;

    let response = post_multipart(
        app.clone(),
        &format!("/api/v1/public/widgets/{id}/submit"),
        &[("name", None, b"Ada"), ("cv", Some("cv.pdf"), b"%PDF-1.4")],
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"action": "redirect_url", "value": "https://example.com/thanks"})
    );

    let response = get_auth(app, &format!("/api/v1/widgets/{id}/submissions"), &token).await;
    let record = body_json(response).await["data"]["submissions"][0]["data"].clone();
    let url = record["CV"].as_str().unwrap();
    assert!(url.starts_with("http://testserver/media/widget_files/"));
    assert!(url.ends_with(".pdf"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submissions_download_as_csv(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let mut form = lead_form();
    form["email_notification"] = Value::Null;
    let id = create_widget(app.clone(), &token, form).await;
    let download = format!("/api/v1/widgets/{id}/submissions/download");

    let response = get_auth(app.clone(), &download, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "No data found.");

    post_json(
        app.clone(),
        &format!("/api/v1/public/widgets/{id}/submit"),
        json!({"name": "Ada", "mail": "ada@example.com", "terms": true}),
    )
    .await;

    let response = get_auth(app, &download, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/csv");
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("attachment;"));
    let csv = body_text(response).await;
    assert!(csv.contains("Name"));
    assert!(csv.contains("ada@example.com"));
}
