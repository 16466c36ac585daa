//! Integration tests for appointment widgets and public bookings.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use chrono_tz::Europe::Berlin;
use common::{
    access_token, body_json, drain_tasks, get, get_auth, patch_json_auth, post_json,
    post_json_auth, register_and_login,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use widgetry_db::repositories::UserRepo;
use widgetry_events::{SheetTarget, Task};

fn salon() -> Value {
    json!({
        "name": "Salon booking",
        "business_name": "Snip & Co",
        "time_zone": "Europe/Berlin",
        "service": {"name": "Haircut", "duration": 30, "price": {"currency": "EUR", "type": "fixed", "price": 25}},
        "day_schedules": [
            {"day": "monday", "is_open": true, "time_ranges": [["09:00", "12:00"], ["13:00", "18:00"]]}
        ],
        "min_advance_minutes": 60,
        "max_advance_days": 30,
        "embed_type": "popup",
        "business_phone": "+49 30 1234",
        "client_notification": true,
        "owner_notification": true,
        "owner_email": "owner@snip.example"
    })
}

async fn create_widget(app: axum::Router, token: &str) -> Value {
    let response = post_json_auth(app, "/api/v1/appointments/widgets", salon(), token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// The next Monday (at least a day away) at `hour:minute` salon time.
fn next_monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    let mut day = Utc::now().with_timezone(&Berlin).date_naive() + Duration::days(1);
    while day.weekday() != Weekday::Mon {
        day += Duration::days(1);
    }
    Berlin
        .from_local_datetime(&day.and_hms_opt(hour, minute, 0).unwrap())
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn booking_at(date: DateTime<Utc>) -> Value {
    json!({
        "date": date.to_rfc3339(),
        "name": "Bea",
        "email": "bea@example.com",
        "notes": "First visit"
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_flattens_display_settings(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;

    let widget = create_widget(app, &token).await;

    assert_eq!(widget["embed_type"], "popup");
    assert_eq!(widget["business_phone"], "+49 30 1234");
    assert_eq!(widget["business_email"], Value::Null);
    assert!(widget.get("display").is_none());
    assert_eq!(widget["service"]["name"], "Haircut");
    assert_eq!(widget["owner_email"], "owner@snip.example");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_time_range_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let mut body = salon();
    body["day_schedules"][0]["time_ranges"] = json!([["9am", "noon"]]);

    let response = post_json_auth(app, "/api/v1/appointments/widgets", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "\"timeRange\" values must be valid ISO 8601 time strings (e.g., \"22:00\")."
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_keeps_schedules_when_list_is_empty(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let widget = create_widget(app.clone(), &token).await;
    let uri = format!("/api/v1/appointments/widgets/{}", widget["id"].as_str().unwrap());

    let response = patch_json_auth(
        app,
        &uri,
        json!({
            "day_schedules": [],
            "width": {"value": 400, "unit": "px"},
            "service": {"price": {"price": 30}},
            "accent_color": "#ff0066"
        }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["day_schedules"][0]["day"], "monday");
    assert_eq!(updated["width"]["unit"], "px");
    assert_eq!(updated["service"]["price"]["price"], 30);
    assert_eq!(updated["service"]["price"]["currency"], "EUR");
    assert_eq!(updated["accent_color"], "#ff0066");
    assert_eq!(updated["embed_type"], "popup");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn public_widget_hides_owner_settings(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let widget = create_widget(app.clone(), &token).await;

    let response = get(app.clone(), &format!("/api/v1/appointments/{}", widget["id"].as_str().unwrap())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["business_name"], "Snip & Co");
    assert!(data.get("owner_email").is_none());
    assert!(data.get("owner_notification").is_none());

    let response = get(app, &format!("/api/v1/appointments/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "widget doesn't exist");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn booking_is_recorded_and_queues_side_effects(pool: PgPool) {
    let (app, mut tasks) = common::build_test_app_with_tasks(pool.clone());
    let login = register_and_login(app.clone(), "owner@example.com").await;
    let token = login["access_token"].as_str().unwrap().to_string();
    UserRepo::set_oauth(&pool, login["user"]["id"].as_i64().unwrap())
        .await
        .unwrap();
    let widget = create_widget(app.clone(), &token).await;
    let id = widget["id"].as_str().unwrap();

    let response = post_json(
        app.clone(),
        &format!("/api/v1/appointments/{id}"),
        booking_at(next_monday_at(10, 0)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        json!({"message": "Appointment booked successfully!"})
    );

    let queued = drain_tasks(&mut tasks);
    assert_eq!(queued.len(), 3);
    assert_matches!(
        &queued[0],
        Task::AppendToSheet { target: SheetTarget::AppointmentWidget(_), values, header }
            if values[0] == "Bea" && header[2] == "Date Time"
    );
    assert_matches!(
        &queued[1],
        Task::SendEmail(m) if m.subject == "New Appointment Booked"
            && m.to == vec!["owner@snip.example".to_string()]
    );
    assert_matches!(
        &queued[2],
        Task::SendEmail(m) if m.subject == "Appointment Confirmation - Snip & Co"
            && m.body.contains("Haircut")
    );

    let response = get_auth(
        app,
        &format!("/api/v1/appointments/widgets/{id}/bookings"),
        &token,
    )
    .await;
    let bookings = body_json(response).await["data"].clone();
    assert_eq!(bookings.as_array().unwrap().len(), 1);
    assert_eq!(bookings[0]["email"], "bea@example.com");
    assert_eq!(bookings[0]["notes"], "First visit");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn booking_outside_the_window_is_rejected(pool: PgPool) {
    let (app, mut tasks) = common::build_test_app_with_tasks(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let widget = create_widget(app.clone(), &token).await;
    let uri = format!("/api/v1/appointments/{}", widget["id"].as_str().unwrap());

    let response = post_json(app.clone(), &uri, booking_at(Utc::now())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let too_far = next_monday_at(10, 0) + Duration::weeks(5);
    let response = post_json(app.clone(), &uri, booking_at(too_far)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad_email = booking_at(next_monday_at(10, 0));
    bad_email["email"] = json!("not-an-email");
    let response = post_json(app, &uri, bad_email).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(drain_tasks(&mut tasks).is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn booking_outside_business_hours_is_rejected(pool: PgPool) {
    let (app, mut tasks) = common::build_test_app_with_tasks(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let widget = create_widget(app.clone(), &token).await;
    let uri = format!("/api/v1/appointments/{}", widget["id"].as_str().unwrap());

    for date in [
        next_monday_at(12, 30),
        next_monday_at(18, 0),
        next_monday_at(10, 0) + Duration::days(1),
    ] {
        let response = post_json(app.clone(), &uri, booking_at(date)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "booking at {date}");
    }

    assert!(drain_tasks(&mut tasks).is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn oversized_advance_limit_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let mut body = salon();
    body["max_advance_days"] = json!(i32::MAX);

    let response = post_json_auth(app.clone(), "/api/v1/appointments/widgets", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let widget = create_widget(app.clone(), &token).await;
    let uri = format!("/api/v1/appointments/widgets/{}", widget["id"].as_str().unwrap());
    let response = patch_json_auth(app, &uri, json!({"min_advance_minutes": i32::MAX}), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reversed_time_range_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = access_token(app.clone(), "owner@example.com").await;
    let mut body = salon();
    body["day_schedules"][0]["time_ranges"] = json!([["17:00", "09:00"]]);

    let response = post_json_auth(app, "/api/v1/appointments/widgets", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn booking_unknown_widget_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/appointments/{}", uuid::Uuid::new_v4()),
        booking_at(next_monday_at(10, 0)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Appointment Widget not found.");
}
