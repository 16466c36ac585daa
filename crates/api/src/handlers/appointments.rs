//! Appointment widgets: owner CRUD, the public widget view and bookings.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use validator::ValidateEmail;
use widgetry_core::appointment::{
    booking_sheet_values, flatten_display, parse_day_schedules, parse_service,
    parse_special_intervals, parse_time_zone, take_display_fields, validate_booking,
    validate_booking_window, BookingRequest, BookingWindow, BOOKING_CONFIRMED,
    BOOKING_SHEET_HEADER,
};
use widgetry_core::config_merge::{merge_patch, update_section, Patch};
use widgetry_core::error::CoreError;
use widgetry_core::notification::{appointment_confirmation, appointment_owner_notice};
use widgetry_core::types::PublicId;
use widgetry_db::models::appointment::{
    AppointmentBooking, AppointmentWidget, AppointmentWidgetWrite, CreateBooking,
};
use widgetry_db::repositories::{AppointmentBookingRepo, AppointmentWidgetRepo, UserRepo};
use widgetry_events::{SheetTarget, Task};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const WIDGET_NOT_FOUND: &str = "widget doesn't exist";

/// Create/update body.
///
/// Business card and embed settings arrive as flat keys and are collected
/// into the widget's `display` document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentPayload {
    pub name: Patch<String>,
    pub business_name: Patch<String>,
    pub time_zone: Patch<String>,
    pub service: Patch<Value>,
    /// Replaces the stored list when non-empty.
    pub day_schedules: Option<Value>,
    /// Replaces the stored list when non-empty.
    pub special_intervals: Option<Value>,
    pub min_advance_minutes: Patch<i32>,
    pub max_advance_days: Patch<i32>,
    pub width: Patch<Value>,
    pub background: Patch<Value>,
    pub client_notification: Patch<bool>,
    pub owner_notification: Patch<bool>,
    pub owner_email: Patch<String>,
    pub integration_google_sheets: Patch<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppointmentPayload {
    fn apply(mut self, target: &mut AppointmentWidgetWrite) -> AppResult<()> {
        target.name = self.name.unwrap_or(std::mem::take(&mut target.name));
        target.business_name = self
            .business_name
            .unwrap_or(std::mem::take(&mut target.business_name));
        target.time_zone = self.time_zone.unwrap_or(std::mem::take(&mut target.time_zone));
        parse_time_zone(&target.time_zone)?;

        let stored_service = Some(std::mem::take(&mut target.service)).filter(|s| !s.is_null());
        target.service = update_section("service", stored_service, &self.service)?
            .ok_or_else(|| CoreError::Validation("service is required".into()))?;
        parse_service(&target.service)?;

        if let Some(schedules) = self.day_schedules.filter(|v| !is_empty_list(v)) {
            parse_day_schedules(&schedules)?;
            target.day_schedules = schedules;
        }
        if let Some(intervals) = self.special_intervals.filter(|v| !is_empty_list(v)) {
            parse_special_intervals(&intervals)?;
            target.special_intervals = intervals;
        }

        target.min_advance_minutes = self.min_advance_minutes.resolve(target.min_advance_minutes);
        target.max_advance_days = self.max_advance_days.resolve(target.max_advance_days);
        validate_booking_window(BookingWindow {
            min_advance_minutes: target.min_advance_minutes,
            max_advance_days: target.max_advance_days,
        })?;

        target.width = update_section("width", target.width.take(), &self.width)?;
        target.background = update_section("background", target.background.take(), &self.background)?;

        target.client_notification = self.client_notification.unwrap_or(target.client_notification);
        target.owner_notification = self.owner_notification.unwrap_or(target.owner_notification);
        target.owner_email = self
            .owner_email
            .resolve(target.owner_email.take())
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(email) = &target.owner_email {
            if !email.validate_email() {
                return Err(AppError::Core(CoreError::Validation(
                    "owner_email: Enter a valid email address.".into(),
                )));
            }
        }
        target.integration_google_sheets = self
            .integration_google_sheets
            .unwrap_or(target.integration_google_sheets);

        let display = take_display_fields(&mut self.extra);
        if !display.is_empty() {
            merge_patch(&mut target.display, &Value::Object(display));
        }
        Ok(())
    }
}

fn is_empty_list(value: &Value) -> bool {
    value.is_null() || value.as_array().is_some_and(Vec::is_empty)
}

fn new_widget() -> AppointmentWidgetWrite {
    AppointmentWidgetWrite {
        time_zone: "UTC".into(),
        day_schedules: json!([]),
        special_intervals: json!([]),
        display: json!({}),
        ..AppointmentWidgetWrite::default()
    }
}

// ---------------------------------------------------------------------------
// Owner handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/appointments/widgets
pub async fn list_widgets(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let widgets = AppointmentWidgetRepo::list_for_user(&state.pool, user.user_id).await?;
    let data = widgets
        .iter()
        .map(|w| render(w, Audience::Owner))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/appointments/widgets
pub async fn create_widget(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AppointmentPayload>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    let mut write = new_widget();
    payload.apply(&mut write)?;

    let widget = AppointmentWidgetRepo::create(&state.pool, user.user_id, &write).await?;
    tracing::info!(widget_id = %widget.id, user_id = user.user_id, "Appointment widget created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: render(&widget, Audience::Owner)?,
        }),
    ))
}

/// GET /api/v1/appointments/widgets/{id}
pub async fn get_widget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let widget = find_owned(&state, id, &user).await?;
    Ok(Json(DataResponse {
        data: render(&widget, Audience::Owner)?,
    }))
}

/// PUT/PATCH /api/v1/appointments/widgets/{id}
pub async fn update_widget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
    Json(payload): Json<AppointmentPayload>,
) -> AppResult<Json<DataResponse<Value>>> {
    let existing = find_owned(&state, id, &user).await?;
    let mut write = AppointmentWidgetWrite::from(&existing);
    payload.apply(&mut write)?;

    let widget = AppointmentWidgetRepo::update(&state.pool, id, &write)
        .await?
        .ok_or_else(|| AppError::NotFound(WIDGET_NOT_FOUND.into()))?;
    tracing::info!(widget_id = %id, "Appointment widget updated");
    Ok(Json(DataResponse {
        data: render(&widget, Audience::Owner)?,
    }))
}

/// DELETE /api/v1/appointments/widgets/{id}
pub async fn delete_widget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
) -> AppResult<StatusCode> {
    if !AppointmentWidgetRepo::delete_owned(&state.pool, id, user.user_id).await? {
        return Err(AppError::NotFound(WIDGET_NOT_FOUND.into()));
    }
    tracing::info!(widget_id = %id, "Appointment widget deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/appointments/widgets/{id}/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PublicId>,
) -> AppResult<Json<DataResponse<Vec<AppointmentBooking>>>> {
    let widget = find_owned(&state, id, &user).await?;
    let bookings = AppointmentBookingRepo::list_for_widget(&state.pool, widget.id).await?;
    Ok(Json(DataResponse { data: bookings }))
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/appointments/{id}
pub async fn get_public_widget(
    State(state): State<AppState>,
    Path(id): Path<PublicId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let widget = AppointmentWidgetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(WIDGET_NOT_FOUND.into()))?;
    Ok(Json(DataResponse {
        data: render(&widget, Audience::Public)?,
    }))
}

/// POST /api/v1/appointments/{id}
///
/// Records a booking, then queues the spreadsheet row and the emails.
pub async fn book(
    State(state): State<AppState>,
    Path(id): Path<PublicId>,
    Json(request): Json<BookingRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let widget = AppointmentWidgetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment Widget not found.".into()))?;

    validate_booking(
        &request,
        widget.booking_window(),
        &widget.availability(),
        Utc::now(),
    )?;

    let booking = AppointmentBookingRepo::create(
        &state.pool,
        &CreateBooking {
            appointment_widget_id: widget.id,
            date: request.date,
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            notes: request.notes.clone().filter(|n| !n.trim().is_empty()),
        },
    )
    .await?;

    let owner = UserRepo::find_by_id(&state.pool, widget.user_id).await?;
    if owner.as_ref().is_some_and(|o| o.is_oauth) {
        state.tasks.dispatch(Task::AppendToSheet {
            target: SheetTarget::AppointmentWidget(widget.id),
            values: booking_sheet_values(&request),
            header: BOOKING_SHEET_HEADER.iter().map(|h| h.to_string()).collect(),
        });
    }

    if widget.owner_notification {
        if let Some(owner_email) = widget.owner_email.as_deref() {
            state.tasks.dispatch(Task::SendEmail(appointment_owner_notice(owner_email)));
        }
    }

    if widget.client_notification {
        let reply_to = owner.as_ref().map(|o| o.email.as_str()).unwrap_or_default();
        state.tasks.dispatch(Task::SendEmail(appointment_confirmation(
            &widget.business_name,
            &booking.name,
            widget.service_name(),
            &booking.email,
            reply_to,
        )));
    }

    tracing::info!(widget_id = %widget.id, booking_id = booking.id, "Appointment booked");
    Ok((StatusCode::CREATED, Json(json!({ "message": BOOKING_CONFIRMED }))))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Owner,
    /// Booking visitors: owner contact, notification and sheet settings
    /// are hidden.
    Public,
}

async fn find_owned(state: &AppState, id: PublicId, user: &AuthUser) -> AppResult<AppointmentWidget> {
    AppointmentWidgetRepo::find_owned(&state.pool, id, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(WIDGET_NOT_FOUND.into()))
}

/// Render a widget with its `display` settings as top-level keys.
fn render(widget: &AppointmentWidget, audience: Audience) -> AppResult<Value> {
    let mut out = match serde_json::to_value(widget) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(AppError::InternalError("Widget did not serialize to an object".into())),
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };

    out.remove("display");
    flatten_display(&mut out, &widget.display);

    match audience {
        Audience::Owner => {
            if let Some(owner) = out.remove("user_id") {
                out.insert("user".into(), owner);
            }
        }
        Audience::Public => {
            for key in [
                "user_id",
                "owner_email",
                "sheet_id",
                "client_notification",
                "owner_notification",
                "integration_google_sheets",
            ] {
                out.remove(key);
            }
        }
    }
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn payload(value: Value) -> AppointmentPayload {
        serde_json::from_value(value).unwrap()
    }

    fn service() -> Value {
        json!({"name": "Haircut", "duration": 30, "price": {"currency": "USD", "type": "fixed", "price": 25}})
    }

    #[test]
    fn create_requires_service() {
        let mut write = new_widget();
        assert_matches!(
            payload(json!({"name": "Salon"})).apply(&mut write),
            Err(AppError::Core(CoreError::Validation(m))) if m == "service is required"
        );
    }

    #[test]
    fn flat_display_keys_are_collected() {
        let mut write = new_widget();
        payload(json!({
            "name": "Salon",
            "service": service(),
            "embed_type": "popup",
            "business_phone": "+1 555",
            "unknown_key": true
        }))
        .apply(&mut write)
        .unwrap();

        assert_eq!(write.display, json!({"embed_type": "popup", "business_phone": "+1 555"}));
        assert_eq!(write.time_zone, "UTC");
    }

    #[test]
    fn update_merges_service_and_keeps_schedules_on_empty_list() {
        let mut write = new_widget();
        write.service = service();
        write.day_schedules = json!([{"day": "monday", "is_open": true, "time_ranges": [["09:00", "17:00"]]}]);

        payload(json!({"service": {"price": {"price": 30}}, "day_schedules": []}))
            .apply(&mut write)
            .unwrap();

        assert_eq!(write.service["name"], "Haircut");
        assert_eq!(write.service["price"]["price"], 30);
        assert_eq!(write.service["price"]["currency"], "USD");
        assert_eq!(write.day_schedules[0]["day"], "monday");
    }

    #[test]
    fn invalid_time_range_is_rejected() {
        let mut write = new_widget();
        let result = payload(json!({
            "service": service(),
            "day_schedules": [{"day": "monday", "is_open": true, "time_ranges": [["09:00"]]}]
        }))
        .apply(&mut write);
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::Validation(m))) if m.contains("exactly two")
        );
    }

    #[test]
    fn advance_limits_are_bounded() {
        for body in [
            json!({"service": service(), "max_advance_days": i32::MAX}),
            json!({"service": service(), "min_advance_minutes": -5}),
        ] {
            let mut write = new_widget();
            assert_matches!(
                payload(body).apply(&mut write),
                Err(AppError::Core(CoreError::Validation(_)))
            );
        }
    }

    #[test]
    fn unknown_time_zone_is_rejected() {
        let mut write = new_widget();
        let result = payload(json!({"service": service(), "time_zone": "Mars/Olympus"})).apply(&mut write);
        assert_matches!(result, Err(AppError::Core(CoreError::Validation(m))) if m.contains("time_zone"));
    }

    #[test]
    fn owner_email_must_be_valid() {
        let mut write = new_widget();
        let result = payload(json!({"service": service(), "owner_email": "nope"})).apply(&mut write);
        assert_matches!(result, Err(AppError::Core(CoreError::Validation(_))));
    }
}
