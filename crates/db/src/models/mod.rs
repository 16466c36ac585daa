//! Row models and write DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and the DTOs the repositories accept for inserts and updates.

pub mod appointment;
pub mod form_template;
pub mod google;
pub mod image_upload;
pub mod pricing;
pub mod session;
pub mod submission;
pub mod user;
pub mod widget;
