//! Appointment widget rules: schedule validation and booking checks.

use chrono::{Datelike, Duration, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Column header used when a booking spreadsheet is created.
pub const BOOKING_SHEET_HEADER: [&str; 4] = ["Name", "Email", "Date Time", "Note"];

/// Upper bound for `min_advance_minutes` (one year).
pub const MAX_MIN_ADVANCE_MINUTES: i32 = 525_600;

/// Upper bound for `max_advance_days` (ten years).
pub const MAX_MAX_ADVANCE_DAYS: i32 = 3_650;

/// Confirmation message returned to the booking client.
pub const BOOKING_CONFIRMED: &str = "Appointment booked successfully!";

/// Presentation settings kept together in the widget's `display` document
/// and exposed as flat top-level keys in the API.
pub const DISPLAY_KEYS: &[&str] = &[
    "business_about",
    "business_address",
    "business_phone",
    "business_email",
    "business_website",
    "business_picture",
    "business_logo",
    "display_business_card",
    "embed_type",
    "trigger_type",
    "trigger_text",
    "trigger_position",
    "text_color",
    "accent_color",
    "background_color",
    "font_family",
    "font_url",
];

/// Move the display keys out of a flat payload. Unknown keys are dropped.
pub fn take_display_fields(payload: &mut Map<String, Value>) -> Map<String, Value> {
    DISPLAY_KEYS
        .iter()
        .filter_map(|key| payload.remove(*key).map(|v| (key.to_string(), v)))
        .collect()
}

/// Copy a stored display document back into a rendered widget.
pub fn flatten_display(rendered: &mut Map<String, Value>, display: &Value) {
    if let Some(fields) = display.as_object() {
        for key in DISPLAY_KEYS {
            rendered.insert(key.to_string(), fields.get(*key).cloned().unwrap_or(Value::Null));
        }
    }
}

/// Price of the bookable service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePrice {
    #[serde(default)]
    pub currency: String,
    #[serde(rename = "type", default)]
    pub price_type: String,
    #[serde(default)]
    pub price: Value,
}

/// The service an appointment widget books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    pub price: ServicePrice,
}

/// Opening hours for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day: String,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub time_ranges: Vec<Value>,
}

impl DaySchedule {
    pub fn weekday(&self) -> Option<Weekday> {
        self.day.trim().parse().ok()
    }
}

/// A dated exception to the weekly schedule (holiday, extra hours).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialInterval {
    #[serde(rename = "type")]
    pub interval_type: String,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    #[serde(default)]
    pub working_hours: Value,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parse and validate the `service` section of an appointment widget.
pub fn parse_service(value: &Value) -> Result<ServiceConfig, CoreError> {
    let service: ServiceConfig = serde_json::from_value(value.clone())
        .map_err(|e| CoreError::Validation(format!("Invalid service: {e}")))?;
    if service.name.trim().is_empty() {
        return Err(CoreError::Validation("Service name is required".into()));
    }
    Ok(service)
}

/// Validate one `[start, end]` time range; `start` must come before `end`.
pub fn validate_time_range(value: &Value) -> Result<(NaiveTime, NaiveTime), CoreError> {
    let items = value
        .as_array()
        .ok_or_else(|| CoreError::Validation("\"time_range\" should be a list.".into()))?;
    if items.len() != 2 {
        return Err(CoreError::Validation(
            "\"time_range\" must contain exactly two time strings.".into(),
        ));
    }
    let parse = |v: &Value| v.as_str().and_then(parse_iso_time);
    match (parse(&items[0]), parse(&items[1])) {
        (Some(start), Some(end)) if start < end => Ok((start, end)),
        (Some(_), Some(_)) => Err(CoreError::Validation(
            "\"time_range\" start must be before its end.".into(),
        )),
        _ => Err(CoreError::Validation(
            "\"timeRange\" values must be valid ISO 8601 time strings (e.g., \"22:00\").".into(),
        )),
    }
}

/// Accepts `HH:MM`, `HH:MM:SS` and `HH:MM:SS.fff`.
fn parse_iso_time(s: &str) -> Option<NaiveTime> {
    ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

/// Parse and validate a list of day schedules.
pub fn parse_day_schedules(value: &Value) -> Result<Vec<DaySchedule>, CoreError> {
    let schedules: Vec<DaySchedule> = serde_json::from_value(value.clone())
        .map_err(|e| CoreError::Validation(format!("Invalid day_schedules: {e}")))?;
    for schedule in &schedules {
        if schedule.day.trim().is_empty() {
            return Err(CoreError::Validation("Day schedule must name a day".into()));
        }
        if schedule.weekday().is_none() {
            return Err(CoreError::Validation(format!(
                "Unknown day \"{}\" in day schedule",
                schedule.day
            )));
        }
        for range in &schedule.time_ranges {
            validate_time_range(range)?;
        }
    }
    Ok(schedules)
}

/// Parse and validate a list of special intervals.
pub fn parse_special_intervals(value: &Value) -> Result<Vec<SpecialInterval>, CoreError> {
    let intervals: Vec<SpecialInterval> = serde_json::from_value(value.clone())
        .map_err(|e| CoreError::Validation(format!("Invalid special_intervals: {e}")))?;
    if let Some(bad) = intervals.iter().find(|i| i.end_date < i.start_date) {
        return Err(CoreError::Validation(format!(
            "Special interval ends ({}) before it starts ({})",
            bad.end_date, bad.start_date
        )));
    }
    for interval in &intervals {
        match &interval.working_hours {
            Value::Null => {}
            Value::Array(ranges) => {
                for range in ranges {
                    validate_time_range(range)?;
                }
            }
            _ => {
                return Err(CoreError::Validation(
                    "\"working_hours\" should be a list of time ranges.".into(),
                ))
            }
        }
    }
    Ok(intervals)
}

/// Parse an IANA time zone name such as `Europe/Berlin`.
pub fn parse_time_zone(name: &str) -> Result<Tz, CoreError> {
    name.trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("Unknown time_zone \"{name}\"")))
}

/// Check the advance limits an owner saves on a widget.
pub fn validate_booking_window(window: BookingWindow) -> Result<(), CoreError> {
    for (key, value, max) in [
        ("min_advance_minutes", window.min_advance_minutes, MAX_MIN_ADVANCE_MINUTES),
        ("max_advance_days", window.max_advance_days, MAX_MAX_ADVANCE_DAYS),
    ] {
        if let Some(value) = value {
            if !(0..=max).contains(&value) {
                return Err(CoreError::Validation(format!(
                    "{key} must be between 0 and {max}"
                )));
            }
        }
    }
    Ok(())
}

/// When a widget takes bookings, in the widget's own time zone.
///
/// A special interval covering the booking date overrides the weekly
/// schedule for that date: its `working_hours` are the open ranges, and
/// an interval without any closes the date. Without day schedules every
/// other date is open; with them, only listed open days are. An open day
/// without time ranges is open all day.
#[derive(Debug, Clone)]
pub struct Availability {
    pub time_zone: Tz,
    pub day_schedules: Vec<DaySchedule>,
    pub special_intervals: Vec<SpecialInterval>,
}

impl Availability {
    /// Build from stored widget columns. Entries that no longer parse are
    /// skipped and an unknown zone falls back to UTC.
    pub fn from_stored(time_zone: &str, day_schedules: &Value, special_intervals: &Value) -> Self {
        Self {
            time_zone: parse_time_zone(time_zone).unwrap_or(Tz::UTC),
            day_schedules: lenient_list(day_schedules),
            special_intervals: lenient_list(special_intervals),
        }
    }

    pub fn is_open_at(&self, at: Timestamp) -> bool {
        let local = at.with_timezone(&self.time_zone);
        let (date, time) = (local.date_naive(), local.time());

        if let Some(interval) = self
            .special_intervals
            .iter()
            .find(|i| i.start_date <= date && date <= i.end_date)
        {
            let ranges = interval.working_hours.as_array().map(Vec::as_slice).unwrap_or_default();
            return in_any_range(ranges, time);
        }

        if self.day_schedules.is_empty() {
            return true;
        }
        self.day_schedules
            .iter()
            .filter(|s| s.is_open && s.weekday() == Some(local.weekday()))
            .any(|s| s.time_ranges.is_empty() || in_any_range(&s.time_ranges, time))
    }
}

fn lenient_list<T: serde::de::DeserializeOwned>(value: &Value) -> Vec<T> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// `time` falls in `[start, end)` of one of the valid ranges.
fn in_any_range(ranges: &[Value], time: NaiveTime) -> bool {
    ranges
        .iter()
        .filter_map(|range| validate_time_range(range).ok())
        .any(|(start, end)| start <= time && time < end)
}

/// A booking submitted through the public appointment widget.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub date: Timestamp,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Advance-booking limits configured on the widget.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingWindow {
    pub min_advance_minutes: Option<i32>,
    pub max_advance_days: Option<i32>,
}

/// Validate a booking against the widget's window relative to `now` and
/// its opening hours.
///
/// A limit too large to add to `now` does not restrict anything.
pub fn validate_booking(
    request: &BookingRequest,
    window: BookingWindow,
    availability: &Availability,
    now: Timestamp,
) -> Result<(), CoreError> {
    if request.name.trim().is_empty() {
        return Err(CoreError::Validation("name is required".into()));
    }
    if !request.email.validate_email() {
        return Err(CoreError::Validation("Enter a valid email address.".into()));
    }
    if let Some(min) = window.min_advance_minutes {
        let earliest = Duration::try_minutes(i64::from(min)).and_then(|d| now.checked_add_signed(d));
        if earliest.is_some_and(|earliest| request.date < earliest) {
            return Err(CoreError::Validation(format!(
                "Appointments must be booked at least {min} minutes in advance"
            )));
        }
    }
    if let Some(max) = window.max_advance_days {
        let latest = Duration::try_days(i64::from(max)).and_then(|d| now.checked_add_signed(d));
        if latest.is_some_and(|latest| request.date > latest) {
            return Err(CoreError::Validation(format!(
                "Appointments cannot be booked more than {max} days in advance"
            )));
        }
    }
    if !availability.is_open_at(request.date) {
        return Err(CoreError::Validation(
            "The selected time is outside the business hours.".into(),
        ));
    }
    Ok(())
}

/// Spreadsheet values for a booking, aligned with [`BOOKING_SHEET_HEADER`].
pub fn booking_sheet_values(request: &BookingRequest) -> Vec<String> {
    vec![
        request.name.clone(),
        request.email.clone(),
        request.date.to_rfc3339(),
        request.notes.clone().unwrap_or_default(),
    ]
}
