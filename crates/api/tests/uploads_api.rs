//! Integration tests for builder image uploads and media serving.

mod common;

use axum::http::StatusCode;
use common::{access_token, body_json, body_text, get, post_multipart};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn uploaded_image_is_served_under_media(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;

    let response = post_multipart(
        app.clone(),
        "/api/v1/uploads/images",
        &[("image", Some("logo.PNG"), b"not-really-a-png")],
        Some(&token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert!(data["id"].is_number());
    let url = data["url"].as_str().unwrap();
    assert!(url.starts_with("http://testserver/media/uploads/"));

    let path = url.trim_start_matches("http://testserver");
    let response = get(app, path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "not-really-a-png");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn non_image_upload_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;

    let response = post_multipart(
        app,
        "/api/v1/uploads/images",
        &[("image", Some("payload.exe"), b"MZ")],
        Some(&token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_requires_image_field_and_auth(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;

    let response = post_multipart(
        app.clone(),
        "/api/v1/uploads/images",
        &[("picture", Some("logo.png"), b"x")],
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_multipart(
        app,
        "/api/v1/uploads/images",
        &[("image", Some("logo.png"), b"x")],
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
