//! Domain logic for the widget builder backend.
//!
//! Everything in this crate is pure: no database, no network. The API and
//! task crates call into it for validation, payload shaping and the small
//! amount of cryptography the platform needs.

pub mod appointment;
pub mod config_merge;
pub mod crypto;
pub mod csv_export;
pub mod error;
pub mod notification;
pub mod pricing;
pub mod roles;
pub mod submission;
pub mod types;
pub mod widget_fields;
