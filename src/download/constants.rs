//! Constants for the download module (timeouts, chunking, backoff).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default size of the slices written to disk between checkpoints (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Smallest accepted chunk size (1 KiB).
pub const MIN_CHUNK_SIZE: usize = 1024;

/// Largest accepted chunk size (64 KiB).
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// Backoff time unit: attempt `k` waits `unit * 2^k`.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Upper bound on a single backoff wait.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);
