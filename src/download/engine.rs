//! Session engine: runs a pool of workers over one shared queue.
//!
//! This module provides the `DownloadEngine`, which coordinates concurrent
//! transfers by spawning a fixed number of worker tasks that drain a
//! [`WorkQueue`]. Each worker runs one [`TransferTask`] at a time; retries
//! with exponential backoff happen inside the task.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use transfer_core::download::{DownloadEngine, HttpClient, RetryPolicy};
//! use transfer_core::queue::WorkQueue;
//! use transfer_core::sink::{LogSink, Reporter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(4, RetryPolicy::default())?;
//! let queue = WorkQueue::from_urls(["https://example.com/a.iso"]);
//! let stats = engine
//!     .process_queue(&queue, Arc::new(HttpClient::new()?), Path::new("./downloads"), Reporter::new(LogSink))
//!     .await?;
//! println!("Completed: {}, Abandoned: {}, Retried: {}", stats.completed(), stats.abandoned(), stats.retried());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, instrument, warn};

use super::constants::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use super::fetch::Fetcher;
use super::retry::RetryPolicy;
use super::task::TransferTask;
use super::worker::Worker;
use crate::control::ControlSignals;
use crate::queue::WorkQueue;
use crate::sink::Reporter;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default number of workers.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Error type for session setup. Per-transfer failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Chunk size outside the supported range.
    #[error(
        "invalid chunk size {value}: must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE} bytes"
    )]
    InvalidChunkSize {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Output directory does not exist or is not a directory.
    #[error("output directory {} does not exist", path.display())]
    MissingOutputDir {
        /// The directory that was checked.
        path: PathBuf,
    },

    /// The session was started with nothing to transfer.
    #[error("no URLs to transfer")]
    EmptyRequestList,
}

/// Statistics from one session run.
///
/// Uses atomic counters for thread-safe updates from concurrent workers.
/// `stopped` counts the subset of `abandoned` tasks that ended because the
/// session was stopped rather than because retries ran out.
#[derive(Debug, Default)]
pub struct DownloadStats {
    completed: AtomicUsize,
    abandoned: AtomicUsize,
    retried: AtomicUsize,
    stopped: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of transfers that reached 100%.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the number of abandoned transfers (retries exhausted or stopped).
    #[must_use]
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Returns the total number of items processed (completed + abandoned).
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.abandoned()
    }

    /// Returns the number of retry attempts made.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Returns the number of transfers ended by a session stop.
    #[must_use]
    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_stopped(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Self {
        Self {
            completed: AtomicUsize::new(self.completed()),
            abandoned: AtomicUsize::new(self.abandoned()),
            retried: AtomicUsize::new(self.retried()),
            stopped: AtomicUsize::new(self.stopped()),
        }
    }
}

/// Concurrent transfer engine.
///
/// # Concurrency Model
///
/// - `concurrency` workers, each its own Tokio task
/// - Workers share one [`WorkQueue`]; which worker takes which item is a race
/// - Each worker runs one transfer at a time
/// - Every worker observes the same [`ControlSignals`], available through
///   [`signals`](Self::signals) before or during a run
///
/// # Retry Behavior
///
/// - Every failure is retried until the policy's attempt limit is reached
/// - Backoff waits end early when the session is stopped
/// - A task that fails never affects the other tasks
#[derive(Debug)]
pub struct DownloadEngine {
    /// Number of workers to spawn.
    concurrency: usize,
    /// Retry policy for failed attempts.
    retry_policy: RetryPolicy,
    /// Write granularity; one checkpoint per chunk.
    chunk_size: usize,
    /// Pause/stop handle shared with every worker.
    signals: ControlSignals,
}

impl DownloadEngine {
    /// Creates a new engine with the specified concurrency limit and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use transfer_core::download::{DownloadEngine, RetryPolicy};
    ///
    /// let engine = DownloadEngine::new(10, RetryPolicy::default()).unwrap();
    /// assert_eq!(engine.concurrency(), 10);
    /// ```
    #[instrument(level = "debug", skip(retry_policy))]
    pub fn new(concurrency: usize, retry_policy: RetryPolicy) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(
            concurrency,
            max_retries = retry_policy.max_attempts(),
            backoff_unit_ms = retry_policy.unit().as_millis(),
            "creating download engine"
        );

        Ok(Self {
            concurrency,
            retry_policy,
            chunk_size: DEFAULT_CHUNK_SIZE,
            signals: ControlSignals::new(),
        })
    }

    /// Sets the chunk size used for writes and checkpoints.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidChunkSize`] outside 1 KiB to 64 KiB.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self, EngineError> {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
            return Err(EngineError::InvalidChunkSize { value: chunk_size });
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the configured chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns a handle for pausing, resuming, or stopping this engine's sessions.
    #[must_use]
    pub fn signals(&self) -> ControlSignals {
        self.signals.clone()
    }

    /// Processes every pending item in the queue and returns when all workers are idle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyRequestList`] if the queue is empty and
    /// [`EngineError::MissingOutputDir`] if `output_dir` is not a directory.
    ///
    /// Individual transfer failures do NOT cause this method to error; they
    /// are reported through `reporter` and counted in the stats.
    #[instrument(skip(self, queue, fetcher, reporter), fields(output_dir = %output_dir.display()))]
    pub async fn process_queue(
        &self,
        queue: &WorkQueue,
        fetcher: Arc<dyn Fetcher>,
        output_dir: &Path,
        reporter: Reporter,
    ) -> Result<DownloadStats, EngineError> {
        let pending = queue.len();
        if pending == 0 {
            return Err(EngineError::EmptyRequestList);
        }
        let is_dir = tokio::fs::metadata(output_dir)
            .await
            .is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return Err(EngineError::MissingOutputDir {
                path: output_dir.to_path_buf(),
            });
        }

        let stats = Arc::new(DownloadStats::new());
        let task = Arc::new(TransferTask::new(
            fetcher,
            self.signals.clone(),
            reporter,
            self.retry_policy.clone(),
            output_dir.to_path_buf(),
            self.chunk_size,
            Arc::clone(&stats),
        ));
        task.plan_destinations(&queue.pending_items());

        let workers = self.concurrency.min(pending);
        info!(pending, workers, "starting queue processing");

        let handles: Vec<_> = (0..workers)
            .map(|id| tokio::spawn(Worker::new(id, queue.clone(), Arc::clone(&task)).run()))
            .collect();

        for handle in handles {
            // A panicked worker is logged; the rest of the session carries on.
            match handle.await {
                Ok(report) => debug!(
                    worker = report.worker_id,
                    completed = report.completed,
                    abandoned = report.abandoned,
                    "worker joined"
                ),
                Err(e) => warn!(error = %e, "worker task panicked"),
            }
        }

        let completed = stats.completed();
        let abandoned = stats.abandoned();
        info!(
            completed,
            abandoned,
            retried = stats.retried(),
            stopped = stats.stopped(),
            total = completed + abandoned,
            "queue processing complete"
        );

        Ok(stats.snapshot())
    }
}
