use std::path::PathBuf;

use widgetry_google::GoogleOAuthConfig;

use crate::auth::jwt::JwtConfig;

/// Default capacity of the background task channel.
const DEFAULT_TASK_QUEUE_CAPACITY: usize = 1024;

/// Server configuration loaded from environment variables.
///
/// Everything except the secrets has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for queued tasks to drain (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Application secret; the Google token encryption key derives from it.
    pub secret_key: String,
    /// Origin used to build absolute URLs for media files and scripts.
    pub public_base_url: String,
    /// Directory uploaded files are written to and served from.
    pub media_root: PathBuf,
    /// Google sign-in and Sheets access; `None` disables both.
    pub google: Option<GoogleOAuthConfig>,
    /// reCAPTCHA secret; forms with spam protection are rejected without it.
    pub recaptcha_secret: Option<String>,
    /// Capacity of the background task channel.
    pub task_queue_capacity: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                    |
    /// |----------------------------------|----------------------------|
    /// | `HOST`                           | `0.0.0.0`                  |
    /// | `PORT`                           | `3000`                     |
    /// | `CORS_ORIGINS`                   | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`           | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`          | `30`                       |
    /// | `SECRET_KEY`                     | **required**               |
    /// | `PUBLIC_BASE_URL`                | `http://localhost:3000`    |
    /// | `MEDIA_ROOT`                     | `media`                    |
    /// | `GOOGLE_OAUTH2_CLIENT_ID`        | unset (Google disabled)    |
    /// | `GOOGLE_OAUTH2_CLIENT_SECRET`    | required with client id    |
    /// | `GOOGLE_OAUTH2_REDIRECT_URI`     | required with client id    |
    /// | `RECAPTCHA_SECRET_KEY`           | unset                      |
    /// | `TASK_QUEUE_CAPACITY`            | `1024`                     |
    ///
    /// # Panics
    ///
    /// Panics on malformed numbers, a missing `SECRET_KEY`, or a partial
    /// Google OAuth registration.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        let secret_key =
            std::env::var("SECRET_KEY").expect("SECRET_KEY must be set in the environment");
        assert!(!secret_key.is_empty(), "SECRET_KEY must not be empty");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let media_root = PathBuf::from(std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into()));

        let google = optional_env("GOOGLE_OAUTH2_CLIENT_ID").map(|client_id| {
            GoogleOAuthConfig::new(
                client_id,
                optional_env("GOOGLE_OAUTH2_CLIENT_SECRET")
                    .expect("GOOGLE_OAUTH2_CLIENT_SECRET must be set with GOOGLE_OAUTH2_CLIENT_ID"),
                optional_env("GOOGLE_OAUTH2_REDIRECT_URI")
                    .expect("GOOGLE_OAUTH2_REDIRECT_URI must be set with GOOGLE_OAUTH2_CLIENT_ID"),
            )
        });

        let recaptcha_secret = optional_env("RECAPTCHA_SECRET_KEY");

        let task_queue_capacity: usize = std::env::var("TASK_QUEUE_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_TASK_QUEUE_CAPACITY.to_string())
            .parse()
            .expect("TASK_QUEUE_CAPACITY must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            secret_key,
            public_base_url,
            media_root,
            google,
            recaptcha_secret,
            task_queue_capacity,
        }
    }

    /// Absolute URL for a path on this server.
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Absolute URL of a file stored under the media root. Values that
    /// already are absolute URLs pass through.
    pub fn media_url(&self, relative_path: &str) -> String {
        if relative_path.starts_with("http://") || relative_path.starts_with("https://") {
            return relative_path.to_string();
        }
        self.absolute_url(&format!("media/{}", relative_path.trim_start_matches('/')))
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A set, non-blank environment variable.
fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec![],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 5,
            jwt: JwtConfig {
                secret: "s".into(),
                access_token_expiry_mins: 15,
                refresh_token_expiry_days: 7,
            },
            secret_key: "k".into(),
            public_base_url: base.into(),
            media_root: PathBuf::from("media"),
            google: None,
            recaptcha_secret: None,
            task_queue_capacity: 8,
        }
    }

    #[test]
    fn absolute_urls_join_with_single_slash() {
        let cfg = config("https://forms.example.com/");
        assert_eq!(
            cfg.absolute_url("/form-builder/script/x.js"),
            "https://forms.example.com/form-builder/script/x.js"
        );
        assert_eq!(
            cfg.media_url("uploads/logo.png"),
            "https://forms.example.com/media/uploads/logo.png"
        );
        assert_eq!(cfg.media_url("https://cdn.io/a.png"), "https://cdn.io/a.png");
    }

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" https://a.io, ,https://b.io "),
            vec!["https://a.io".to_string(), "https://b.io".to_string()]
        );
    }
}
