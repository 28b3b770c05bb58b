//! HTTP implementation of the [`Fetcher`] capability.
//!
//! This module provides the `HttpClient` struct which issues ranged GET
//! requests with proper timeout configuration and maps transport failures
//! into [`DownloadError`].

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, RANGE};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::fetch::{FetchResponse, Fetcher};
use crate::user_agent;

/// HTTP client for ranged, streaming fetches.
///
/// This client is designed to be created once and shared by every worker,
/// taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use transfer_core::download::{Fetcher, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let response = client.fetch("https://example.com/file.iso", 4096).await?;
/// println!("resumed: {}, remaining: {:?}", response.partial, response.content_length);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot be initialized.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent::default_user_agent())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str, offset: u64) -> Result<FetchResponse, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let mut request = self.client.get(url);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={offset}-"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let partial = status == StatusCode::PARTIAL_CONTENT;
        let content_length = declared_content_length(&response);
        debug!(
            status = status.as_u16(),
            partial,
            content_length,
            offset,
            "response received"
        );

        let owned_url = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| DownloadError::network(owned_url.clone(), e)));

        Ok(FetchResponse::new(partial, content_length, Box::pin(body)))
    }
}

fn declared_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_defaults() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_client_builds_with_custom_timeouts() {
        assert!(HttpClient::with_timeouts(5, 10).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let client = HttpClient::new().unwrap();
        let result = client.fetch("definitely-not-a-url", 0).await;
        assert!(
            matches!(result, Err(DownloadError::InvalidUrl { .. })),
            "Expected InvalidUrl, got: {result:?}"
        );
    }
}
