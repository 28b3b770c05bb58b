//! Session-wide control signals: a pause/resume gate and a one-shot stop flag.
//!
//! A [`ControlSignals`] value is created once per session and cloned into
//! every worker and transfer task. The controller flips the signals; tasks
//! observe them at [`checkpoint`](ControlSignals::checkpoint) calls (one per
//! chunk), during the retry backoff [`wait`](ControlSignals::wait), and while
//! blocked on the network via [`stopped`](ControlSignals::stopped). Nothing is
//! ever torn mid-write.
//!
//! # Example
//!
//! ```
//! use transfer_core::{Checkpoint, ControlSignals};
//!
//! # async fn example() {
//! let signals = ControlSignals::new();
//! assert_eq!(signals.checkpoint().await, Checkpoint::Continue);
//!
//! signals.stop();
//! assert_eq!(signals.checkpoint().await, Checkpoint::Stopped);
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What a task should do after passing a suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Keep transferring.
    Continue,
    /// The session was stopped; end the task without reporting an error.
    Stopped,
}

impl Checkpoint {
    /// Returns true for [`Checkpoint::Stopped`].
    #[must_use]
    pub fn is_stopped(self) -> bool {
        self == Self::Stopped
    }
}

/// Shared pause gate and stop flag.
///
/// Cloning is cheap; all clones observe and control the same session.
#[derive(Debug, Clone)]
pub struct ControlSignals {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// `true` while running, `false` while paused.
    running: watch::Sender<bool>,
    /// Monotonic: once cancelled, never reset.
    stopped: CancellationToken,
}

impl Default for ControlSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSignals {
    /// Creates signals in the running, not-stopped state.
    #[must_use]
    pub fn new() -> Self {
        let (running, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                running,
                stopped: CancellationToken::new(),
            }),
        }
    }

    /// Closes the gate: tasks block at their next checkpoint.
    pub fn pause(&self) {
        if self.inner.running.send_replace(false) {
            info!("session paused");
        }
    }

    /// Opens the gate again.
    pub fn resume(&self) {
        if !self.inner.running.send_replace(true) {
            info!("session resumed");
        }
    }

    /// Sets the stop flag. Idempotent; also releases tasks blocked while paused.
    pub fn stop(&self) {
        if !self.inner.stopped.is_cancelled() {
            info!("session stop requested");
        }
        self.inner.stopped.cancel();
    }

    /// Returns true while the gate is closed.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        !*self.inner.running.borrow()
    }

    /// Returns true once [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.is_cancelled()
    }

    /// Suspends the caller while paused, then reports whether the session is stopped.
    pub async fn checkpoint(&self) -> Checkpoint {
        if self.is_stopped() {
            return Checkpoint::Stopped;
        }
        if !self.is_paused() {
            return Checkpoint::Continue;
        }

        let running = self.inner.running.subscribe();
        tokio::select! {
            biased;
            () = self.stopped() => Checkpoint::Stopped,
            () = wait_until_running(running) => self.current(),
        }
    }

    /// Resolves once the session is stopped.
    pub async fn stopped(&self) {
        self.inner.stopped.cancelled().await;
    }

    /// Sleeps for `duration` unless the session is stopped first.
    pub async fn wait(&self, duration: Duration) -> Checkpoint {
        tokio::select! {
            biased;
            () = self.stopped() => Checkpoint::Stopped,
            () = tokio::time::sleep(duration) => Checkpoint::Continue,
        }
    }

    fn current(&self) -> Checkpoint {
        if self.is_stopped() {
            Checkpoint::Stopped
        } else {
            Checkpoint::Continue
        }
    }
}

async fn wait_until_running(mut running: watch::Receiver<bool>) {
    // The sender lives in `Inner`, which outlives every checkpoint call.
    let _ = running.wait_for(|running| *running).await;
}
