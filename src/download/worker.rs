//! Worker loop: drains the shared queue one transfer at a time.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::task::{TransferOutcome, TransferTask};
use crate::queue::WorkQueue;

/// Per-worker tally returned when the queue runs dry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker number within the session, starting at 0.
    pub worker_id: usize,
    /// Tasks that reached 100%.
    pub completed: usize,
    /// Tasks that ran out of retries or were stopped.
    pub abandoned: usize,
}

/// Pulls items from a [`WorkQueue`] and runs each to completion before the next.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    queue: WorkQueue,
    task: Arc<TransferTask>,
}

impl Worker {
    /// Creates worker `id` over a shared queue and task runner.
    #[must_use]
    pub fn new(id: usize, queue: WorkQueue, task: Arc<TransferTask>) -> Self {
        Self { id, queue, task }
    }

    /// Runs until `dequeue` returns `None`.
    ///
    /// A stopped session still drains the queue: each remaining task observes
    /// the stop at its first checkpoint and ends abandoned without fetching.
    #[instrument(skip(self), fields(worker = self.id))]
    pub async fn run(self) -> WorkerReport {
        let mut report = WorkerReport {
            worker_id: self.id,
            ..WorkerReport::default()
        };

        while let Some(item) = self.queue.dequeue() {
            match self.task.run(&item).await {
                TransferOutcome::Completed => report.completed += 1,
                TransferOutcome::Abandoned => report.abandoned += 1,
            }
        }

        debug!(
            completed = report.completed,
            abandoned = report.abandoned,
            "queue empty"
        );
        info!(worker = self.id, "worker finished");
        report
    }
}
