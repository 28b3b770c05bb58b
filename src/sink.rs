//! Progress and error reporting contract.
//!
//! Transfer tasks never talk to a [`ProgressSink`] directly; they go through
//! a [`Reporter`], which holds the sink behind one mutex shared by every
//! worker of a session. A sink therefore never sees two calls at once and
//! may keep plain mutable state.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use crate::download::TransferOutcome;

/// Observer of per-task progress and failures.
///
/// `index` is the task's submission position in the work queue.
pub trait ProgressSink: Send {
    /// Percentage complete in `[0, 100]`. Ends with exactly `100.0` on success.
    fn on_progress(&mut self, index: usize, percent: f64);

    /// One failed attempt: `attempt k/limit failed: <cause>`.
    fn on_error(&mut self, index: usize, message: &str);

    /// Bytes on disk for a resource whose total size is unknown.
    fn on_bytes(&mut self, _index: usize, _bytes: u64) {}

    /// Terminal outcome of a task.
    fn on_finished(&mut self, _index: usize, _outcome: TransferOutcome) {}
}

/// Serializing handle to a session's sink.
///
/// Cloned into every transfer task; all clones share one lock.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<Mutex<dyn ProgressSink>>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

impl Reporter {
    /// Wraps `sink` behind the session lock.
    pub fn new(sink: impl ProgressSink + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Reports progress, clamped to `[0, 100]`.
    pub fn progress(&self, index: usize, percent: f64) {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        self.with_sink(|sink| sink.on_progress(index, percent));
    }

    /// Reports a failed attempt.
    pub fn error(&self, index: usize, message: &str) {
        self.with_sink(|sink| sink.on_error(index, message));
    }

    /// Reports raw byte count for unknown-length resources.
    pub fn bytes(&self, index: usize, bytes: u64) {
        self.with_sink(|sink| sink.on_bytes(index, bytes));
    }

    /// Reports the terminal outcome of a task.
    pub fn finished(&self, index: usize, outcome: TransferOutcome) {
        self.with_sink(|sink| sink.on_finished(index, outcome));
    }

    fn with_sink(&self, report: impl FnOnce(&mut dyn ProgressSink)) {
        // A sink that panicked mid-report leaves no invariant we rely on.
        let mut guard = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        report(&mut *guard);
    }
}

/// Sink that forwards every report to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn on_progress(&mut self, index: usize, percent: f64) {
        info!(index, percent = format_args!("{percent:.1}"), "progress");
    }

    fn on_error(&mut self, index: usize, message: &str) {
        warn!(index, error = %message, "transfer attempt failed");
    }

    fn on_bytes(&mut self, index: usize, bytes: u64) {
        info!(index, bytes, "progress (size unknown)");
    }

    fn on_finished(&mut self, index: usize, outcome: TransferOutcome) {
        info!(index, ?outcome, "transfer finished");
    }
}
