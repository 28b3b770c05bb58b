//! In-memory work queue shared by the workers of one session.
//!
//! # Overview
//!
//! - [`WorkQueue`] - priority-ordered, thread-safe queue of pending requests
//! - [`ResourceRequest`] - immutable `{url, priority}` pair
//! - [`QueueItem`] - a dequeued request plus its submission index
//!
//! Requests come out in ascending priority; equal priorities come out in
//! submission order. `dequeue` never blocks: the session is finite, so an
//! empty queue means the worker is done.
//!
//! # Example
//!
//! ```
//! use transfer_core::queue::{ResourceRequest, WorkQueue};
//!
//! let queue = WorkQueue::new();
//! queue.submit(ResourceRequest::new("https://example.com/late.bin", 5));
//! queue.submit(ResourceRequest::new("https://example.com/early.bin", 1));
//!
//! let first = queue.dequeue().unwrap();
//! assert_eq!(first.url(), "https://example.com/early.bin");
//! assert_eq!(first.index, 1);
//! ```

mod item;

pub use item::{DEFAULT_PRIORITY, QueueItem, ResourceRequest};

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use item::PendingEntry;
use tracing::{debug, instrument};

/// Priority-ordered queue of pending transfers.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    state: Arc<Mutex<QueueState>>,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: BinaryHeap<Reverse<PendingEntry>>,
    next_index: usize,
}

impl WorkQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a queue where each URL's priority is its position in `urls`.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = Self::new();
        for (position, url) in urls.into_iter().enumerate() {
            let priority = i64::try_from(position).unwrap_or(i64::MAX);
            queue.submit(ResourceRequest::new(url, priority));
        }
        queue
    }

    /// Adds a request; returns its submission index. O(log n).
    #[instrument(skip(self), fields(url = %request.url(), priority = request.priority()))]
    pub fn submit(&self, request: ResourceRequest) -> usize {
        let mut state = self.lock();
        let index = state.next_index;
        state.next_index += 1;
        state.pending.push(Reverse(PendingEntry(QueueItem { index, request })));
        debug!(index, "request submitted");
        index
    }

    /// Removes and returns the next request, or `None` when nothing is pending.
    ///
    /// Atomic with respect to concurrent callers: each request is handed out once.
    pub fn dequeue(&self) -> Option<QueueItem> {
        let item = self.lock().pending.pop().map(|Reverse(entry)| entry.0);
        if let Some(item) = &item {
            debug!(index = item.index, url = %item.url(), "dequeued item");
        }
        item
    }

    /// Copies of the pending items in dequeue order, leaving the queue untouched.
    #[must_use]
    pub fn pending_items(&self) -> Vec<QueueItem> {
        let mut items: Vec<QueueItem> = self
            .lock()
            .pending
            .iter()
            .map(|Reverse(entry)| entry.0.clone())
            .collect();
        items.sort_by_key(|item| (item.request.priority(), item.index));
        items
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Returns true when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
