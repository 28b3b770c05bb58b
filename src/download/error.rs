//! Error types for the download module.
//!
//! Every variant describes why a single transfer attempt failed. The
//! `Display` output is what ends up in the `<cause>` part of the
//! `attempt k/limit failed: <cause>` error events.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a single transfer attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (anything other than 200 or 206).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (open, write, flush).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The body ended before the declared content length was received.
    #[error("stream from {url} ended early: expected {expected_bytes} bytes, got {actual_bytes}")]
    Truncated {
        /// The URL whose body was cut short.
        url: String,
        /// Total size the server declared (including resumed bytes).
        expected_bytes: u64,
        /// Bytes present on disk when the stream ended.
        actual_bytes: u64,
    },

    /// Transport failure reported by a non-HTTP fetcher.
    #[error("transfer of {url} failed: {message}")]
    Transport {
        /// The URL being fetched.
        url: String,
        /// Human-readable cause.
        message: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a truncated-stream error.
    pub fn truncated(url: impl Into<String>, expected_bytes: u64, actual_bytes: u64) -> Self {
        Self::Truncated {
            url: url.into(),
            expected_bytes,
            actual_bytes,
        }
    }

    /// Creates a generic transport error for custom fetchers.
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Returns true when the server rejected the requested byte range (HTTP 416).
    #[must_use]
    pub fn is_range_not_satisfiable(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 416, .. })
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// url or path the source error does not carry.
