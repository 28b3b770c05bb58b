//! Transfer Engine Core Library
//!
//! This library provides a resumable, retrying, pausable multi-file transfer
//! engine: a priority queue of requests drained by a pool of workers, each
//! streaming one resource at a time to disk.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`queue`] - Priority-ordered work queue shared by the workers
//! - [`control`] - Session-wide pause/resume gate and stop flag
//! - [`download`] - Transfer task, workers, engine, and the HTTP fetcher
//! - [`sink`] - Progress and error reporting contract
//! - [`config`] - Session settings and the optional TOML config file

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod control;
pub mod download;
pub mod queue;
pub mod sink;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, FileConfig, SessionConfig, load_default_file_config};
pub use control::{Checkpoint, ControlSignals};
pub use download::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DownloadEngine, DownloadError, DownloadStats,
    EngineError, FetchResponse, Fetcher, HttpClient, RetryDecision, RetryPolicy, TransferOutcome,
};
pub use queue::{QueueItem, ResourceRequest, WorkQueue};
pub use sink::{LogSink, ProgressSink, Reporter};
