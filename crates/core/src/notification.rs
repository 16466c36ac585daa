//! Composition of the notification emails sent after submissions and
//! bookings.
//!
//! Messages are plain data; delivery happens in the task runner. The
//! platform always sends from its own configured address, so the widget
//! owner's identity travels as display name and reply-to.

use serde::{Deserialize, Serialize};

use crate::submission::ProcessedSubmission;

/// An outgoing plain-text email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    /// Display name placed in front of the platform sender address.
    pub from_name: Option<String>,
    pub reply_to: Option<String>,
    pub to: Vec<String>,
}

/// Per-widget email settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailNotificationConfig {
    /// Send `response_subject` / `response_message` to the submitter.
    pub auto_responder_email: bool,
    pub response_subject: String,
    pub response_message: String,
    pub sender_name: String,
    pub subject: String,
    pub message: String,
    /// Owner-side recipients.
    pub email: Vec<String>,
}

/// Auto-response to the submitter, when enabled and an email value exists.
pub fn auto_response(
    config: &EmailNotificationConfig,
    submission: &ProcessedSubmission,
    owner_email: &str,
) -> Option<EmailMessage> {
    if !config.auto_responder_email {
        return None;
    }
    let receiver = submission.email_receiver()?;
    Some(EmailMessage {
        subject: config.response_subject.clone(),
        body: config.response_message.clone(),
        from_name: None,
        reply_to: Some(owner_email.to_string()),
        to: vec![receiver.to_string()],
    })
}

/// Notification to the widget owner's recipients listing every value.
///
/// Returns `None` when no recipients are configured.
pub fn owner_notification(
    config: &EmailNotificationConfig,
    submission: &ProcessedSubmission,
) -> Option<EmailMessage> {
    if config.email.is_empty() {
        return None;
    }
    Some(EmailMessage {
        subject: config.subject.clone(),
        body: format!("{}\n{}", config.message, submission.summary()),
        from_name: non_empty(&config.sender_name),
        reply_to: None,
        to: config.email.clone(),
    })
}

/// "New appointment" notice for the appointment widget owner.
pub fn appointment_owner_notice(owner_email: &str) -> EmailMessage {
    EmailMessage {
        subject: "New Appointment Booked".to_string(),
        body: format!("Hi {owner_email},\n\nA new appointment has been booked."),
        from_name: None,
        reply_to: Some(owner_email.to_string()),
        to: vec![owner_email.to_string()],
    }
}

/// Booking confirmation for the client.
pub fn appointment_confirmation(
    business_name: &str,
    client_name: &str,
    service_name: &str,
    client_email: &str,
    owner_email: &str,
) -> EmailMessage {
    EmailMessage {
        subject: format!("Appointment Confirmation - {business_name}"),
        body: format!("Hi {client_name},\n\nYour appointment for {service_name} is confirmed!"),
        from_name: non_empty(business_name),
        reply_to: Some(owner_email.to_string()),
        to: vec![client_email.to_string()],
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
