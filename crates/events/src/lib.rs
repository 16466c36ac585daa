//! Background side effects of submissions and bookings.
//!
//! - [`TaskQueue`] / [`Task`]: fire-and-forget dispatch from request
//!   handlers onto a bounded in-process channel.
//! - [`TaskRunner`]: long-lived consumer executing each task once.
//! - [`delivery::email`]: SMTP delivery through `lettre`.
//! - [`CredentialStore`]: encrypted Google credentials with on-demand
//!   access-token refresh.
//! - [`SheetWriter`]: appends rows to the owner's Google spreadsheet,
//!   creating it on first use.

pub mod credentials;
pub mod delivery;
pub mod error;
pub mod queue;
pub mod runner;
pub mod sheets;

pub use credentials::CredentialStore;
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use error::TaskError;
pub use queue::{SheetTarget, Task, TaskQueue};
pub use runner::TaskRunner;
pub use sheets::SheetWriter;
