//! Google OAuth 2.0 authorization-code flow.

use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::error::GoogleError;

/// Scopes requested on the consent screen.
pub const SCOPES: [&str; 3] = [
    "openid",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/spreadsheets",
];

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// OAuth client registration.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleOAuthConfig {
    /// Registration against Google's production endpoints.
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }
}

/// Body of a token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Absolute expiry of the access token.
    pub fn expires_at(&self) -> Option<chrono::DateTime<Utc>> {
        self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs))
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
}

/// Client for Google's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuthClient {
    pub fn new(http: reqwest::Client, config: GoogleOAuthConfig) -> Self {
        Self { http, config }
    }

    /// Consent-screen URL for `state`. Requests offline access and forces
    /// the consent prompt so Google issues a refresh token.
    pub fn authorization_url(&self, state: &str) -> String {
        let scope = SCOPES.join(" ");
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}\
             &access_type=offline&include_granted_scopes=true&prompt=consent",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GoogleError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        let response = self.http.post(&self.config.token_url).form(&params).send().await?;
        let tokens = GoogleError::check(response).await?.json().await?;
        tracing::debug!("Exchanged OAuth authorization code");
        Ok(tokens)
    }

    /// Obtain a fresh access token from a refresh token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, GoogleError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let response = self.http.post(&self.config.token_url).form(&params).send().await?;
        Ok(GoogleError::check(response).await?.json().await?)
    }

    /// Email address of the account that granted `access_token`.
    pub async fn user_email(&self, access_token: &str) -> Result<String, GoogleError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;
        let info: UserInfo = GoogleError::check(response).await?.json().await?;
        info.email
            .ok_or_else(|| GoogleError::Malformed("userinfo response has no email".into()))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn client(base: &str) -> GoogleOAuthClient {
        let mut config = GoogleOAuthConfig::new(
            "client-id".into(),
            "client-secret".into(),
            "http://localhost:3000/api/google/callback".into(),
        );
        config.token_url = format!("{base}/token");
        config.userinfo_url = format!("{base}/userinfo");
        GoogleOAuthClient::new(reqwest::Client::new(), config)
    }

    #[test]
    fn authorization_url_carries_state_and_offline_access() {
        let url = client("http://unused").authorization_url("st4te");
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("state=st4te"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fgoogle%2Fcallback"));
        assert!(url.contains("spreadsheets"));
    }

    #[tokio::test]
    async fn exchange_code_parses_tokens() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::UrlEncoded("code".into(), "abc".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at","refresh_token":"rt","expires_in":3599,"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let tokens = client(&server.url()).exchange_code("abc").await.unwrap();
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt"));
        assert!(tokens.expires_at().unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let err = client(&server.url()).exchange_code("bad").await.unwrap_err();
        assert_matches!(err, GoogleError::Api { status: 400, body } if body.contains("invalid_grant"));
    }

    #[tokio::test]
    async fn user_email_requires_email_claim() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer at")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sub":"123"}"#)
            .create_async()
            .await;

        assert_matches!(
            client(&server.url()).user_email("at").await,
            Err(GoogleError::Malformed(_))
        );
    }
}
