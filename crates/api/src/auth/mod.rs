//! Authentication primitives.
//!
//! - [`password`]: Argon2id hashing for email/password accounts.
//! - [`jwt`]: access tokens and opaque refresh tokens.

pub mod jwt;
pub mod password;
