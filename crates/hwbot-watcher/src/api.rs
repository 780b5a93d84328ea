//! HTTP client for the homework status API.
//!
//! Provides [`PracticumClient`], which performs exactly one GET per call and
//! classifies failures into transport, status and decoding errors. Retrying
//! is left to the poll loop.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, instrument};

use crate::error::{Result, WatcherError};
use crate::response::ApiResponse;

/// Anything that can answer "what changed since `cursor`?".
///
/// Implemented by [`PracticumClient`]; tests drive the poll loop with
/// scripted sources.
#[allow(async_fn_in_trait)]
pub trait HomeworkSource {
    /// Fetches homework updates newer than `cursor` (a Unix timestamp).
    async fn fetch(&self, cursor: i64) -> Result<ApiResponse>;
}

/// Client for the homework status endpoint.
#[derive(Debug, Clone)]
pub struct PracticumClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PracticumClient {
    /// Creates a client that authenticates with `OAuth <token>`.
    ///
    /// # Errors
    ///
    /// Returns `WatcherError::ConfigValidationError` if the token cannot be
    /// used as a header value, or `WatcherError::Transport` if the HTTP
    /// client cannot be built.
    pub fn new(token: &str, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("OAuth {token}")).map_err(|e| {
            WatcherError::config_validation(
                format!("PRACTICUM_TOKEN is not a valid header value: {e}"),
                "Check the token for stray whitespace or control characters",
            )
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(WatcherError::Transport)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl HomeworkSource for PracticumClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self, cursor: i64) -> Result<ApiResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("from_date", cursor)])
            .send()
            .await
            .map_err(WatcherError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatcherError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let raw = response.text().await.map_err(WatcherError::Transport)?;
        let body = serde_json::from_str(&raw).map_err(WatcherError::MalformedResponse)?;

        debug!(bytes = raw.len(), "homework API replied");
        Ok(ApiResponse::new(body))
    }
}
