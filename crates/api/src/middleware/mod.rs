//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`]: the caller identified by a Bearer access token;
//!   `Option<AuthUser>` accepts anonymous callers.
//! - [`rbac::RequireAdmin`]: staff accounts only.

pub mod auth;
pub mod rbac;
