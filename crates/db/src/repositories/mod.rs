//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod appointment_repo;
pub mod form_template_repo;
pub mod google_token_repo;
pub mod image_upload_repo;
pub mod oauth_state_repo;
pub mod pricing_repo;
pub mod session_repo;
pub mod submission_repo;
pub mod user_repo;
pub mod widget_repo;

pub use appointment_repo::{AppointmentBookingRepo, AppointmentWidgetRepo};
pub use form_template_repo::FormTemplateRepo;
pub use google_token_repo::GoogleTokenRepo;
pub use image_upload_repo::ImageUploadRepo;
pub use oauth_state_repo::OAuthStateRepo;
pub use pricing_repo::{PricingColumnRepo, PricingContainerRepo};
pub use session_repo::SessionRepo;
pub use submission_repo::{SubmissionRepo, WidgetFileRepo};
pub use user_repo::UserRepo;
pub use widget_repo::{AdminBrandInfoRepo, EmailNotificationRepo, PreFillRepo, WidgetRepo};
