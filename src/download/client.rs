//! HTTP client wrapper for streaming transfers.
//!
//! Builds the shared `reqwest` client with the timeout profile the engine
//! relies on: a short, finite connect timeout and a per-read inactivity
//! timeout, with no total-transfer deadline. Only a stalled *connection*
//! may time out; a large download never fails on elapsed time alone.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::HeaderMap;
use tracing::debug;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_IDLE_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// HTTP client for streaming downloads.
///
/// Designed to be created once and shared across concurrent transfers,
/// taking advantage of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read inactivity timeout: 5 minutes
    /// - Total-transfer timeout: none
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_IDLE_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_idle_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_idle_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Sends a GET request with the supplied headers and checks the status.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`] when the request fails at the
    /// transport level and [`DownloadError::HttpStatus`] for non-success
    /// responses.
    pub(crate) async fn send_get(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "transfer request rejected");
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
