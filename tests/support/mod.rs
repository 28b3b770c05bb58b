//! Shared helpers for integration tests: socket guard, recording sink, scripted fetchers.

#![allow(dead_code)]

pub mod socket_guard;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use transfer_core::{DownloadError, FetchResponse, Fetcher, ProgressSink, TransferOutcome};

/// One report received by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Progress(usize, f64),
    Error(usize, String),
    Bytes(usize, u64),
    Finished(usize, TransferOutcome),
}

/// Sink that records every report in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_for(&self, index: usize) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Progress(i, percent) if i == index => Some(percent),
                _ => None,
            })
            .collect()
    }

    pub fn errors_for(&self, index: usize) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Error(i, message) if i == index => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn bytes_for(&self, index: usize) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Bytes(i, bytes) if i == index => Some(bytes),
                _ => None,
            })
            .collect()
    }

    pub fn outcome_for(&self, index: usize) -> Option<TransferOutcome> {
        self.events().into_iter().find_map(|event| match event {
            Event::Finished(i, outcome) if i == index => Some(outcome),
            _ => None,
        })
    }

    /// Count of progress, error, and byte reports (finish events excluded).
    pub fn report_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| !matches!(event, Event::Finished(..)))
            .count()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&mut self, index: usize, percent: f64) {
        self.events.lock().unwrap().push(Event::Progress(index, percent));
    }

    fn on_error(&mut self, index: usize, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Error(index, message.to_string()));
    }

    fn on_bytes(&mut self, index: usize, bytes: u64) {
        self.events.lock().unwrap().push(Event::Bytes(index, bytes));
    }

    fn on_finished(&mut self, index: usize, outcome: TransferOutcome) {
        self.events.lock().unwrap().push(Event::Finished(index, outcome));
    }
}

/// Serves a fixed byte string, honouring offsets with a partial response.
#[derive(Debug)]
pub struct StaticFetcher {
    content: Vec<u8>,
    offsets: Mutex<Vec<u64>>,
}

impl StaticFetcher {
    pub fn new(content: &[u8]) -> Self {
        Self {
            content: content.to_vec(),
            offsets: Mutex::new(Vec::new()),
        }
    }

    /// Offsets requested so far, in call order.
    pub fn offsets(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, _url: &str, offset: u64) -> Result<FetchResponse, DownloadError> {
        self.offsets.lock().unwrap().push(offset);
        let start = usize::try_from(offset).unwrap().min(self.content.len());
        let rest = Bytes::copy_from_slice(&self.content[start..]);
        let length = rest.len() as u64;
        let body = futures_util::stream::iter(vec![Ok(rest)]);
        Ok(FetchResponse::new(offset > 0, Some(length), Box::pin(body)))
    }
}

/// Fetcher whose single body is fed chunk by chunk from the test.
///
/// The first `fetch` takes the receiver; later calls fail with a transport error.
#[derive(Debug)]
pub struct ChannelFetcher {
    body: Mutex<Option<mpsc::UnboundedReceiver<Bytes>>>,
    content_length: Option<u64>,
}

impl ChannelFetcher {
    pub fn new(content_length: Option<u64>) -> (Self, mpsc::UnboundedSender<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let fetcher = Self {
            body: Mutex::new(Some(rx)),
            content_length,
        };
        (fetcher, tx)
    }
}

#[async_trait]
impl Fetcher for ChannelFetcher {
    async fn fetch(&self, url: &str, _offset: u64) -> Result<FetchResponse, DownloadError> {
        let Some(rx) = self.body.lock().unwrap().take() else {
            return Err(DownloadError::transport(url, "body already taken"));
        };
        let body = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (Ok(chunk), rx))
        });
        Ok(FetchResponse::new(false, self.content_length, Box::pin(body)))
    }
}

/// Waits (up to ~5s) until `condition` holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}
