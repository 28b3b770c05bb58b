//! Queue item types.

use std::cmp::Ordering;
use std::fmt;

/// Default priority for requests submitted without one.
pub const DEFAULT_PRIORITY: i64 = 0;

/// One resource to transfer. Immutable once created.
///
/// Lower `priority` values are dequeued first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRequest {
    url: String,
    priority: i64,
}

impl ResourceRequest {
    /// Creates a request for `url` with the given priority.
    pub fn new(url: impl Into<String>, priority: i64) -> Self {
        Self {
            url: url.into(),
            priority,
        }
    }

    /// Creates a request with [`DEFAULT_PRIORITY`].
    pub fn with_default_priority(url: impl Into<String>) -> Self {
        Self::new(url, DEFAULT_PRIORITY)
    }

    /// Source locator.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ordering key; lower is earlier.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }
}

impl fmt::Display for ResourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (priority {})", self.url, self.priority)
    }
}

/// A request handed out by [`WorkQueue::dequeue`](super::WorkQueue::dequeue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Submission position; used as the task index in every report.
    pub index: usize,
    /// The request itself.
    pub request: ResourceRequest,
}

impl QueueItem {
    /// Shorthand for `self.request.url()`.
    #[must_use]
    pub fn url(&self) -> &str {
        self.request.url()
    }
}

/// Heap entry ordered by `(priority, index)`; `index` keeps ties stable.
#[derive(Debug)]
pub(super) struct PendingEntry(pub(super) QueueItem);

impl PendingEntry {
    fn key(&self) -> (i64, usize) {
        (self.0.request.priority(), self.0.index)
    }
}

impl PartialEq for PendingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PendingEntry {}

impl PartialOrd for PendingEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
