#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::sync::mpsc;
use tower::ServiceExt;

use widgetry_api::auth::jwt::JwtConfig;
use widgetry_api::config::ServerConfig;
use widgetry_api::router::build_app_router;
use widgetry_api::state::AppState;
use widgetry_events::{Task, TaskQueue};
use widgetry_google::GoogleOAuthConfig;

/// Password used by [`register_and_login`].
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` with safe defaults.
///
/// Google and reCAPTCHA are disabled and uploads go to a fresh directory
/// under the system temp dir.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "test-jwt-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        secret_key: "test-secret-key".to_string(),
        public_base_url: "http://testserver".to_string(),
        media_root: test_media_root(),
        google: None,
        recaptcha_secret: None,
        task_queue_capacity: 64,
    }
}

/// [`test_config`] with Google sign-in pointed at a mock server.
pub fn google_test_config(base_url: &str) -> ServerConfig {
    let mut google = GoogleOAuthConfig::new(
        "test-client-id".to_string(),
        "test-client-secret".to_string(),
        "http://testserver/api/v1/auth/google/callback".to_string(),
    );
    google.token_url = format!("{base_url}/token");
    google.userinfo_url = format!("{base_url}/userinfo");
    ServerConfig {
        google: Some(google),
        ..test_config()
    }
}

fn test_media_root() -> PathBuf {
    std::env::temp_dir().join(format!("widgetry-test-media-{}", uuid::Uuid::new_v4()))
}

/// Build the full application router with the production middleware stack.
///
/// Queued tasks are discarded; use [`build_test_app_with_tasks`] to
/// inspect them.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_config(pool, test_config()).0
}

/// Like [`build_test_app`], also returning the receiving end of the task
/// queue so tests can assert on dispatched side effects.
pub fn build_test_app_with_tasks(pool: PgPool) -> (Router, mpsc::Receiver<Task>) {
    build_test_app_with_config(pool, test_config())
}

pub fn build_test_app_with_config(
    pool: PgPool,
    config: ServerConfig,
) -> (Router, mpsc::Receiver<Task>) {
    let (tasks, receiver) = TaskQueue::new(config.task_queue_capacity);
    let state = AppState::new(pool, config.clone(), tasks, reqwest::Client::new());
    (build_app_router(state, &config), receiver)
}

/// Every task queued so far.
pub fn drain_tasks(receiver: &mut mpsc::Receiver<Task>) -> Vec<Task> {
    let mut tasks = Vec::new();
    while let Ok(task) = receiver.try_recv() {
        tasks.push(task);
    }
    tasks
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, empty_request(Method::GET, uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request(Method::GET, uri, Some(token))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request(Method::DELETE, uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, json_request(Method::POST, uri, None, body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn patch_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, json_request(Method::PATCH, uri, Some(token), body)).await
}

/// POST a `multipart/form-data` body.
///
/// `parts` are `(name, file_name, content)`; a `None` file name sends a
/// plain text field.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    parts: &[(&str, Option<&str>, &[u8])],
    token: Option<&str>,
) -> Response {
    let boundary = "widgetry-test-boundary";
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"));
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::from(body)).unwrap()).await
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a response body as text.
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Account helpers
// ---------------------------------------------------------------------------

/// Register `email` with [`TEST_PASSWORD`], log in, and return the full
/// login response.
pub async fn register_and_login(app: Router, email: &str) -> Value {
    let credentials = json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app.clone(), "/api/v1/auth/register", credentials.clone()).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);

    let response = post_json(app, "/api/v1/auth/login", credentials).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await
}

/// Register and log in, returning only the access token.
pub async fn access_token(app: Router, email: &str) -> String {
    let login = register_and_login(app, email).await;
    login["access_token"].as_str().unwrap().to_string()
}
