//! Request handlers.
//!
//! Each submodule holds the async handler functions for one resource.
//! Handlers delegate storage to `widgetry_db` repositories, rules to
//! `widgetry_core`, side effects to the task queue, and map errors via
//! [`AppError`](crate::error::AppError).

pub mod appointments;
pub mod auth;
pub mod form_templates;
pub mod google_oauth;
pub mod pricing;
pub mod public_widgets;
pub mod uploads;
pub mod widgets;
