//! Fetch capability consumed by the transfer task.
//!
//! A [`Fetcher`] opens a byte stream for a URL starting at a given offset.
//! [`HttpClient`](super::HttpClient) is the production implementation; tests
//! plug in scripted fetchers to drive pause/stop deterministically.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use super::DownloadError;

/// A boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, DownloadError>> + Send + 'static>>;

/// Opened response for a (possibly ranged) fetch.
pub struct FetchResponse {
    /// True when the server honoured the range request (HTTP 206).
    pub partial: bool,
    /// Declared length of this response body, if any.
    pub content_length: Option<u64>,
    /// Response body.
    pub body: BodyStream,
}

impl FetchResponse {
    /// Builds a response from its parts.
    #[must_use]
    pub fn new(partial: bool, content_length: Option<u64>, body: BodyStream) -> Self {
        Self {
            partial,
            content_length,
            body,
        }
    }
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("partial", &self.partial)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Capability to fetch a resource from a byte offset onward.
///
/// Implementations must:
/// - request bytes `offset..` when `offset > 0` and report whether the server
///   honoured it via [`FetchResponse::partial`]
/// - fail with [`DownloadError`] on connection errors, timeouts, and any
///   status other than 200/206
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Opens `url` starting at byte `offset`.
    async fn fetch(&self, url: &str, offset: u64) -> Result<FetchResponse, DownloadError>;
}
