//! Session runtime: config resolution, engine setup, and the run itself.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::MultiProgress;
use tracing::{debug, info};
use transfer_core::{LogSink, Reporter, SessionConfig, WorkQueue, load_default_file_config};

use crate::ProcessExit;
use crate::app::{exit_handler, input_processor, progress_manager, session_control, terminal};
use crate::cli::Args;

pub(crate) async fn run_transfer() -> Result<ProcessExit> {
    // Parse before tracing so --help works without logs.
    let args = Args::parse();
    let no_color = terminal::is_no_color_requested(args.no_color);
    let show_progress = terminal::should_show_progress(
        std::io::stderr().is_terminal(),
        args.quiet,
        args.no_progress,
        terminal::is_dumb_terminal(),
    );
    let bars = show_progress.then(MultiProgress::new);
    terminal::init_tracing(args.log_level(show_progress), no_color, bars.clone());
    debug!(?args, "CLI arguments parsed");

    let urls = input_processor::collect_urls(&args.urls)?;
    if urls.is_empty() {
        info!("No input provided. Pass URLs as arguments or pipe them via stdin.");
        info!("Example: echo 'https://example.com/file.iso' | transfer -o downloads");
        return Ok(ProcessExit::Success);
    }

    let config = resolve_config(&args, urls)?;
    let engine = config.engine()?;
    let client = Arc::new(config.http_client()?);

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create output directory '{}'",
                config.output_dir.display()
            )
        })?;

    let reporter = match bars {
        Some(bars) => Reporter::new(progress_manager::TerminalSink::new(bars, &config.urls)),
        None => Reporter::new(LogSink),
    };

    let signals = engine.signals();
    let listener = session_control::spawn_signal_listener(signals.clone());

    info!(
        urls = config.urls.len(),
        concurrency = config.concurrency,
        output_dir = %config.output_dir.display(),
        "starting transfer session"
    );
    let queue = WorkQueue::from_urls(config.urls.iter().cloned());
    let stats = engine
        .process_queue(&queue, client, &config.output_dir, reporter)
        .await?;
    listener.abort();

    info!(
        completed = stats.completed(),
        abandoned = stats.abandoned(),
        retried = stats.retried(),
        stopped = stats.stopped(),
        total = stats.total(),
        "Transfer complete"
    );

    Ok(exit_handler::determine_exit_outcome(
        stats.abandoned(),
        signals.is_stopped(),
    ))
}

/// Defaults, then the config file, then CLI flags; validated.
fn resolve_config(args: &Args, urls: Vec<String>) -> Result<SessionConfig> {
    let loaded = load_default_file_config()?;
    let mut config = SessionConfig::new(urls);
    if let Some(file) = &loaded.config {
        debug!(path = ?loaded.path, "applying config file");
        config = config.with_file_config(file);
    }
    args.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}
