//! Appointment widget and booking models.

use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use widgetry_core::appointment::{Availability, BookingWindow};
use widgetry_core::types::{DbId, PublicId, Timestamp};

/// A row from `appointment_widgets`.
///
/// Business card, embed, trigger, color and font settings live in the
/// flat `display` document.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AppointmentWidget {
    pub id: PublicId,
    pub user_id: DbId,
    pub name: String,
    pub business_name: String,
    pub time_zone: String,
    pub service: Value,
    pub day_schedules: Value,
    pub special_intervals: Value,
    pub min_advance_minutes: Option<i32>,
    pub max_advance_days: Option<i32>,
    pub display: Value,
    pub width: Option<Value>,
    pub background: Option<Value>,
    pub client_notification: bool,
    pub owner_notification: bool,
    pub owner_email: Option<String>,
    pub integration_google_sheets: bool,
    pub sheet_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AppointmentWidget {
    pub fn booking_window(&self) -> BookingWindow {
        BookingWindow {
            min_advance_minutes: self.min_advance_minutes,
            max_advance_days: self.max_advance_days,
        }
    }

    pub fn availability(&self) -> Availability {
        Availability::from_stored(&self.time_zone, &self.day_schedules, &self.special_intervals)
    }

    /// Name of the booked service, empty when the stored document lacks one.
    pub fn service_name(&self) -> &str {
        self.service.get("name").and_then(Value::as_str).unwrap_or_default()
    }
}

/// Every writable appointment widget column.
#[derive(Debug, Clone, Default)]
pub struct AppointmentWidgetWrite {
    pub name: String,
    pub business_name: String,
    pub time_zone: String,
    pub service: Value,
    pub day_schedules: Value,
    pub special_intervals: Value,
    pub min_advance_minutes: Option<i32>,
    pub max_advance_days: Option<i32>,
    pub display: Value,
    pub width: Option<Value>,
    pub background: Option<Value>,
    pub client_notification: bool,
    pub owner_notification: bool,
    pub owner_email: Option<String>,
    pub integration_google_sheets: bool,
}

impl From<&AppointmentWidget> for AppointmentWidgetWrite {
    fn from(w: &AppointmentWidget) -> Self {
        Self {
            name: w.name.clone(),
            business_name: w.business_name.clone(),
            time_zone: w.time_zone.clone(),
            service: w.service.clone(),
            day_schedules: w.day_schedules.clone(),
            special_intervals: w.special_intervals.clone(),
            min_advance_minutes: w.min_advance_minutes,
            max_advance_days: w.max_advance_days,
            display: w.display.clone(),
            width: w.width.clone(),
            background: w.background.clone(),
            client_notification: w.client_notification,
            owner_notification: w.owner_notification,
            owner_email: w.owner_email.clone(),
            integration_google_sheets: w.integration_google_sheets,
        }
    }
}

/// A row from `appointment_bookings`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AppointmentBooking {
    pub id: DbId,
    pub appointment_widget_id: PublicId,
    pub date: Timestamp,
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for recording a booking.
#[derive(Debug)]
pub struct CreateBooking {
    pub appointment_widget_id: PublicId,
    pub date: Timestamp,
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
}
