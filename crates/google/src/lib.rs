//! HTTP clients for the Google services the platform talks to: OAuth 2.0
//! (sign-in and Sheets authorization), the Sheets v4 API and reCAPTCHA.
//!
//! Every client takes its endpoint URLs from a config value so tests can
//! point them at a local mock server.

pub mod error;
pub mod oauth;
pub mod recaptcha;
pub mod sheets;

pub use error::GoogleError;
pub use oauth::{GoogleOAuthClient, GoogleOAuthConfig, TokenResponse};
pub use recaptcha::RecaptchaClient;
pub use sheets::SheetsClient;
