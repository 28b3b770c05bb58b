//! Single-resource transfer with resumption, chunked writes, and retry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::destination::Destinations;
use super::engine::DownloadStats;
use super::fetch::{BodyStream, Fetcher};
use super::retry::{RetryDecision, RetryPolicy};
use super::DownloadError;
use crate::control::{Checkpoint, ControlSignals};
use crate::queue::QueueItem;
use crate::sink::Reporter;

/// Terminal outcome of one transfer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Every byte arrived and a final 100% was reported.
    Completed,
    /// Retries were exhausted or the session was stopped.
    Abandoned,
}

/// Result of one attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptOutcome {
    Finished,
    Stopped,
}

/// Mutable bookkeeping for one active transfer.
#[derive(Debug)]
struct TransferState {
    destination: PathBuf,
    /// Bytes of the destination file already written.
    bytes_on_disk: u64,
    /// Declared total size; recomputed on every attempt.
    total: Option<u64>,
    /// Failed attempts so far.
    attempt: u32,
    /// Highest percentage reported so far; keeps reports non-decreasing.
    last_percent: f64,
}

impl TransferState {
    fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            bytes_on_disk: 0,
            total: None,
            attempt: 0,
            last_percent: 0.0,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn percent(&self) -> Option<f64> {
        self.total
            .filter(|total| *total > 0)
            .map(|total| (self.bytes_on_disk as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
    }
}

/// Downloads one queue item to its destination under `output_dir`.
///
/// One `TransferTask` is shared by all workers of a session; [`run`](Self::run)
/// keeps its per-transfer state on the stack.
pub struct TransferTask {
    fetcher: Arc<dyn Fetcher>,
    signals: ControlSignals,
    reporter: Reporter,
    retry_policy: RetryPolicy,
    destinations: Destinations,
    chunk_size: usize,
    stats: Arc<DownloadStats>,
}

impl std::fmt::Debug for TransferTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferTask")
            .field("retry_policy", &self.retry_policy)
            .field("output_dir", &self.destinations.output_dir())
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl TransferTask {
    /// Creates a task runner.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        signals: ControlSignals,
        reporter: Reporter,
        retry_policy: RetryPolicy,
        output_dir: PathBuf,
        chunk_size: usize,
        stats: Arc<DownloadStats>,
    ) -> Self {
        Self {
            fetcher,
            signals,
            reporter,
            retry_policy,
            destinations: Destinations::new(output_dir),
            chunk_size: chunk_size.max(1),
            stats,
        }
    }

    /// Fixes the destination of every item in `items` before any transfer starts.
    ///
    /// Items sharing a URL filename get index-suffixed files; see
    /// [`Destinations`]. Items never planned are assigned when they run.
    pub(crate) fn plan_destinations(&self, items: &[QueueItem]) {
        self.destinations.plan(items);
    }

    /// Runs the attempt loop for `item` and reports the terminal outcome.
    #[instrument(skip(self, item), fields(index = item.index, url = %item.url()))]
    pub async fn run(&self, item: &QueueItem) -> TransferOutcome {
        let outcome = self.run_attempts(item).await;
        match outcome {
            TransferOutcome::Completed => self.stats.increment_completed(),
            TransferOutcome::Abandoned => self.stats.increment_abandoned(),
        }
        self.reporter.finished(item.index, outcome);
        outcome
    }

    /// Attempt loop.
    ///
    /// Event order for a failed attempt: the attempt counter is incremented,
    /// `attempt k/limit failed` goes to the sink, and only then does the task
    /// wait `backoff(k)`. No wait follows the final attempt, so an exhausted
    /// task reports `Abandoned` as soon as its last error is out. A failure
    /// that arrives after `stop()` is treated as the stop and is not reported.
    async fn run_attempts(&self, item: &QueueItem) -> TransferOutcome {
        let index = item.index;
        let url = item.url();
        let mut state = TransferState::new(self.destinations.resolve(item));
        let limit = self.retry_policy.max_attempts();

        loop {
            if self.signals.checkpoint().await.is_stopped() {
                debug!("stopped before attempt");
                self.stats.increment_stopped();
                return TransferOutcome::Abandoned;
            }

            match self.attempt(index, url, &mut state).await {
                Ok(AttemptOutcome::Finished) => {
                    self.reporter.progress(index, 100.0);
                    info!(
                        path = %state.destination.display(),
                        bytes = state.bytes_on_disk,
                        "transfer complete"
                    );
                    return TransferOutcome::Completed;
                }
                Ok(AttemptOutcome::Stopped) => {
                    info!(bytes = state.bytes_on_disk, "transfer stopped");
                    self.stats.increment_stopped();
                    return TransferOutcome::Abandoned;
                }
                Err(error) if self.signals.is_stopped() => {
                    debug!(error = %error, "attempt failed after stop; not reported");
                    self.stats.increment_stopped();
                    return TransferOutcome::Abandoned;
                }
                Err(error) => {
                    state.attempt += 1;
                    let message = format!("attempt {}/{limit} failed: {error}", state.attempt);
                    // The sink carries the user-facing report.
                    debug!(attempt = state.attempt, error = %error, "transfer attempt failed");
                    self.reporter.error(index, &message);

                    match self.retry_policy.should_retry(state.attempt) {
                        RetryDecision::Retry { delay, attempt } => {
                            info!(
                                attempt,
                                max_attempts = limit,
                                delay_ms = delay.as_millis(),
                                "retrying transfer"
                            );
                            self.stats.increment_retried();
                            if self.signals.wait(delay).await == Checkpoint::Stopped {
                                debug!("stopped during backoff");
                                self.stats.increment_stopped();
                                return TransferOutcome::Abandoned;
                            }
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            warn!(%reason, "abandoning transfer");
                            return TransferOutcome::Abandoned;
                        }
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        index: usize,
        url: &str,
        state: &mut TransferState,
    ) -> Result<AttemptOutcome, DownloadError> {
        let offset = existing_len(&state.destination).await?;
        debug!(offset, attempt = state.attempt + 1, "starting attempt");

        let fetched = tokio::select! {
            biased;
            () = self.signals.stopped() => return Ok(AttemptOutcome::Stopped),
            fetched = self.fetcher.fetch(url, offset) => fetched,
        };
        let response = match fetched {
            Ok(response) => response,
            Err(error) if offset > 0 && error.is_range_not_satisfiable() => {
                // Nothing left past the bytes we already hold.
                debug!(offset, "range not satisfiable; treating file as complete");
                state.bytes_on_disk = offset;
                state.total = Some(offset);
                return Ok(AttemptOutcome::Finished);
            }
            Err(error) => return Err(error),
        };

        let resuming = offset > 0 && response.partial;
        if offset > 0 && !resuming {
            debug!(offset, "server ignored range request; restarting from zero");
        }
        state.bytes_on_disk = if resuming { offset } else { 0 };
        state.total = response
            .content_length
            .map(|len| len.saturating_add(state.bytes_on_disk));

        let file = open_destination(&state.destination, resuming).await?;
        let mut writer = BufWriter::new(file);

        let streamed = self
            .stream_body(index, url, response.body, &mut writer, state)
            .await;
        // Flush on every exit path so the file ends at its last written byte.
        let flushed = writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(state.destination.clone(), e));

        let outcome = streamed?;
        flushed?;

        if outcome == AttemptOutcome::Finished
            && let Some(total) = state.total
            && state.bytes_on_disk < total
        {
            return Err(DownloadError::truncated(url, total, state.bytes_on_disk));
        }
        Ok(outcome)
    }

    async fn stream_body(
        &self,
        index: usize,
        url: &str,
        mut body: BodyStream,
        writer: &mut BufWriter<File>,
        state: &mut TransferState,
    ) -> Result<AttemptOutcome, DownloadError> {
        loop {
            // A stalled read must not hold up a stop.
            let next = tokio::select! {
                biased;
                () = self.signals.stopped() => return Ok(AttemptOutcome::Stopped),
                next = body.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk?;
            for piece in chunk.chunks(self.chunk_size) {
                if self.signals.checkpoint().await.is_stopped() {
                    return Ok(AttemptOutcome::Stopped);
                }
                writer
                    .write_all(piece)
                    .await
                    .map_err(|e| DownloadError::io(state.destination.clone(), e))?;
                state.bytes_on_disk += piece.len() as u64;
                self.report_progress(index, state);
            }
        }
        debug!(url, bytes = state.bytes_on_disk, "stream finished");
        Ok(AttemptOutcome::Finished)
    }

    fn report_progress(&self, index: usize, state: &mut TransferState) {
        match state.percent() {
            // 100 is reserved for the final report after the stream ends.
            Some(percent) if percent > state.last_percent && percent < 100.0 => {
                state.last_percent = percent;
                self.reporter.progress(index, percent);
            }
            Some(_) => {}
            None => self.reporter.bytes(index, state.bytes_on_disk),
        }
    }
}

/// Size of the destination file, or 0 when it does not exist yet.
async fn existing_len(path: &Path) -> Result<u64, DownloadError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(DownloadError::io(path, e)),
    }
}

/// Opens for append when resuming, otherwise creates or truncates.
async fn open_destination(path: &Path, resuming: bool) -> Result<File, DownloadError> {
    let result = if resuming {
        OpenOptions::new().create(true).append(true).open(path).await
    } else {
        File::create(path).await
    };
    result.map_err(|e| DownloadError::io(path, e))
}
