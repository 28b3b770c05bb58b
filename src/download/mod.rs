//! Resumable transfer engine for streaming files to disk.
//!
//! This module provides functionality for transferring files from HTTP/HTTPS
//! URLs (or any other [`Fetcher`]) with resumption, chunked writes, and retry.
//!
//! # Features
//!
//! - Streaming transfers (memory-efficient for large files)
//! - Resumption from partial files via byte-range requests
//! - One destination file per request, even when URL filenames collide
//! - Pause/resume/stop at every chunk boundary
//! - Exponential backoff between attempts, cut short by stop
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Structured error types with full context
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
//! let engine = DownloadEngine::new(2, RetryPolicy::default())?;
//! let queue = WorkQueue::from_urls(["https://example.com/a.iso", "https://example.com/b.iso"]);
//! let client = Arc::new(HttpClient::new()?);
//! let stats = engine
//!     .process_queue(&queue, client, Path::new("./downloads"), Reporter::new(LogSink))
//!     .await?;
//! println!("Completed: {}", stats.completed());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod destination;
mod engine;
mod error;
mod fetch;
mod filename;
mod retry;
mod task;
mod worker;

pub use client::HttpClient;
pub use engine::{DEFAULT_CONCURRENCY, DownloadEngine, DownloadStats, EngineError};
pub use error::DownloadError;
pub use fetch::{BodyStream, FetchResponse, Fetcher};
pub use filename::filename_for_url;
pub use retry::{DEFAULT_MAX_RETRIES, RetryDecision, RetryPolicy};
pub use task::{TransferOutcome, TransferTask};
pub use worker::{Worker, WorkerReport};

// No module-local Result alias: signatures spell out `Result<T, DownloadError>`.
