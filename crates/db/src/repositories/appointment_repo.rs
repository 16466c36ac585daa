//! Repositories for appointment widgets and bookings.

use sqlx::PgPool;
use widgetry_core::types::{DbId, PublicId};

use crate::models::appointment::{
    AppointmentBooking, AppointmentWidget, AppointmentWidgetWrite, CreateBooking,
};

const COLUMNS: &str = "id, user_id, name, business_name, time_zone, service, day_schedules, \
    special_intervals, min_advance_minutes, max_advance_days, display, width, background, \
    client_notification, owner_notification, owner_email, integration_google_sheets, \
    sheet_id, created_at, updated_at";

/// Appointment-booking widgets.
pub struct AppointmentWidgetRepo;

impl AppointmentWidgetRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &AppointmentWidgetWrite,
    ) -> Result<AppointmentWidget, sqlx::Error> {
        let query = format!(
            "INSERT INTO appointment_widgets (id, user_id, name, business_name, time_zone,
                service, day_schedules, special_intervals, min_advance_minutes,
                max_advance_days, display, width, background, client_notification,
                owner_notification, owner_email, integration_google_sheets)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AppointmentWidget>(&query)
            .bind(uuid::Uuid::new_v4())
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.business_name)
            .bind(&input.time_zone)
            .bind(&input.service)
            .bind(&input.day_schedules)
            .bind(&input.special_intervals)
            .bind(input.min_advance_minutes)
            .bind(input.max_advance_days)
            .bind(&input.display)
            .bind(&input.width)
            .bind(&input.background)
            .bind(input.client_notification)
            .bind(input.owner_notification)
            .bind(&input.owner_email)
            .bind(input.integration_google_sheets)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: PublicId,
    ) -> Result<Option<AppointmentWidget>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM appointment_widgets WHERE id = $1");
        sqlx::query_as::<_, AppointmentWidget>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_owned(
        pool: &PgPool,
        id: PublicId,
        user_id: DbId,
    ) -> Result<Option<AppointmentWidget>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM appointment_widgets WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, AppointmentWidget>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<AppointmentWidget>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM appointment_widgets WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, AppointmentWidget>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: PublicId,
        input: &AppointmentWidgetWrite,
    ) -> Result<Option<AppointmentWidget>, sqlx::Error> {
        let query = format!(
            "UPDATE appointment_widgets SET
                name = $2, business_name = $3, time_zone = $4, service = $5,
                day_schedules = $6, special_intervals = $7, min_advance_minutes = $8,
                max_advance_days = $9, display = $10, width = $11, background = $12,
                client_notification = $13, owner_notification = $14, owner_email = $15,
                integration_google_sheets = $16
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AppointmentWidget>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.business_name)
            .bind(&input.time_zone)
            .bind(&input.service)
            .bind(&input.day_schedules)
            .bind(&input.special_intervals)
            .bind(input.min_advance_minutes)
            .bind(input.max_advance_days)
            .bind(&input.display)
            .bind(&input.width)
            .bind(&input.background)
            .bind(input.client_notification)
            .bind(input.owner_notification)
            .bind(&input.owner_email)
            .bind(input.integration_google_sheets)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete_owned(
        pool: &PgPool,
        id: PublicId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM appointment_widgets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_sheet_id(
        pool: &PgPool,
        id: PublicId,
        sheet_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE appointment_widgets SET sheet_id = $2 WHERE id = $1")
            .bind(id)
            .bind(sheet_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

const BOOKING_COLUMNS: &str = "id, appointment_widget_id, date, name, email, notes, created_at";

/// Bookings made through appointment widgets.
pub struct AppointmentBookingRepo;

impl AppointmentBookingRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateBooking,
    ) -> Result<AppointmentBooking, sqlx::Error> {
        let query = format!(
            "INSERT INTO appointment_bookings (appointment_widget_id, date, name, email, notes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {BOOKING_COLUMNS}"
        );
        sqlx::query_as::<_, AppointmentBooking>(&query)
            .bind(input.appointment_widget_id)
            .bind(input.date)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_widget(
        pool: &PgPool,
        widget_id: PublicId,
    ) -> Result<Vec<AppointmentBooking>, sqlx::Error> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM appointment_bookings
             WHERE appointment_widget_id = $1 ORDER BY date"
        );
        sqlx::query_as::<_, AppointmentBooking>(&query)
            .bind(widget_id)
            .fetch_all(pool)
            .await
    }
}
