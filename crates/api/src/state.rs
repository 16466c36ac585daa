use std::sync::Arc;

use widgetry_core::crypto::TokenCipher;
use widgetry_events::{CredentialStore, TaskQueue};
use widgetry_google::{GoogleOAuthClient, RecaptchaClient};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every member is an `Arc`, a pool handle or a client
/// wrapping one.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: widgetry_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Side effects (emails, spreadsheet rows) handed to the task runner.
    pub tasks: TaskQueue,
    /// Encrypted Google credentials of users.
    pub credentials: CredentialStore,
    /// Google OAuth client; `None` when Google is not configured.
    pub oauth: Option<GoogleOAuthClient>,
    /// reCAPTCHA verifier; `None` without a secret.
    pub recaptcha: Option<RecaptchaClient>,
}

impl AppState {
    /// Wire the Google clients and the credential store from `config`.
    pub fn new(
        pool: widgetry_db::DbPool,
        config: ServerConfig,
        tasks: TaskQueue,
        http: reqwest::Client,
    ) -> Self {
        let oauth = config
            .google
            .clone()
            .map(|google| GoogleOAuthClient::new(http.clone(), google));
        let recaptcha = config
            .recaptcha_secret
            .clone()
            .map(|secret| RecaptchaClient::new(http, secret));
        let credentials = CredentialStore::new(
            pool.clone(),
            TokenCipher::from_secret(&config.secret_key),
            oauth.clone(),
        );

        Self {
            pool,
            config: Arc::new(config),
            tasks,
            credentials,
            oauth,
            recaptcha,
        }
    }
}
