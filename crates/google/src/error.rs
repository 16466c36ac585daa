/// Failures talking to Google.
#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Google answered with a non-success status.
    #[error("Google API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// A success response lacked a field we need.
    #[error("Unexpected Google response: {0}")]
    Malformed(String),
}

impl GoogleError {
    /// Turn a non-success response into [`GoogleError::Api`].
    pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response, Self> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::Api {
            status: status.as_u16(),
            body,
        })
    }
}
