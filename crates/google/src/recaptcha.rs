//! reCAPTCHA server-side token verification.

use serde::Deserialize;

use crate::error::GoogleError;

const VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifies tokens produced by the reCAPTCHA widget on embedded forms.
#[derive(Debug, Clone)]
pub struct RecaptchaClient {
    http: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl RecaptchaClient {
    pub fn new(http: reqwest::Client, secret: String) -> Self {
        Self::with_verify_url(http, secret, VERIFY_URL.to_string())
    }

    pub fn with_verify_url(http: reqwest::Client, secret: String, verify_url: String) -> Self {
        Self {
            http,
            secret,
            verify_url,
        }
    }

    /// `true` when Google accepts `token`.
    pub async fn verify(&self, token: &str) -> Result<bool, GoogleError> {
        let params = [("secret", self.secret.as_str()), ("response", token)];
        let response = self.http.post(&self.verify_url).form(&params).send().await?;
        let result: VerifyResponse = GoogleError::check(response).await?.json().await?;
        if !result.success {
            tracing::debug!(error_codes = ?result.error_codes, "reCAPTCHA rejected token");
        }
        Ok(result.success)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    async fn verify_with(body: &str) -> bool {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/siteverify")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("secret".into(), "s3cret".into()),
                Matcher::UrlEncoded("response".into(), "tok".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = RecaptchaClient::with_verify_url(
            reqwest::Client::new(),
            "s3cret".into(),
            format!("{}/siteverify", server.url()),
        );
        client.verify("tok").await.unwrap()
    }

    #[tokio::test]
    async fn accepted_token() {
        assert!(verify_with(r#"{"success": true}"#).await);
    }

    #[tokio::test]
    async fn rejected_token() {
        assert!(!verify_with(r#"{"success": false, "error-codes": ["invalid-input-response"]}"#).await);
    }
}
