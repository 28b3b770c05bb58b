//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;
use transfer_core::SessionConfig;
use transfer_core::config::MAX_RETRY_LIMIT;

/// Resumable batch file transfers.
///
/// Downloads every URL into the output directory, resuming partial files,
/// retrying failures with exponential backoff, and honouring pause/stop
/// requests. URLs come from the arguments or, when none are given, from
/// standard input (one per line).
///
/// Ctrl-C stops the session. On unix, SIGUSR1 pauses and SIGUSR2 resumes.
#[derive(Parser, Debug)]
#[command(name = "transfer")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to transfer, highest priority first
    pub urls: Vec<String>,

    /// Directory to write files into (created if missing)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Number of concurrent workers (1-100)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Attempts per URL before giving up (1-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RETRY_LIMIT)))]
    pub max_retries: Option<u32>,

    /// Bytes written between pause/stop checks (1024-65536)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1024..=65536))]
    pub chunk_size: Option<u32>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Log level implied by `-v`/`-q`; `RUST_LOG` still wins.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Log level for this run. While progress bars are on screen the default
    /// drops to `warn`: per-attempt failures already appear above the bars.
    #[must_use]
    pub fn log_level(&self, progress_bars: bool) -> &'static str {
        if progress_bars && !self.quiet && self.verbose == 0 {
            "warn"
        } else {
            self.default_log_level()
        }
    }

    /// Overwrites config values with every flag given on the command line.
    pub fn apply_to(&self, config: &mut SessionConfig) {
        if let Some(output_dir) = &self.output_dir {
            config.output_dir.clone_from(output_dir);
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = usize::from(concurrency);
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = usize::try_from(chunk_size).unwrap_or(usize::MAX);
        }
    }
}
