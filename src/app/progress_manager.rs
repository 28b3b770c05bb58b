//! Progress UI: one indicatif bar per transfer.

use std::collections::HashMap;

use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressStyle};
use transfer_core::download::filename_for_url;
use transfer_core::{ProgressSink, TransferOutcome};

const PERCENT_TEMPLATE: &str = "{prefix:>24.bold} [{bar:30}] {pos:>3}% {msg}";
const BYTES_TEMPLATE: &str = "{prefix:>24.bold} {spinner} {msg}";

/// Sink that renders per-task bars on stderr.
///
/// Bars are created on the first report for a task, so queued tasks stay
/// invisible until a worker picks them up.
pub(crate) struct TerminalSink {
    multi: MultiProgress,
    labels: Vec<String>,
    bars: HashMap<usize, ProgressBar>,
}

impl TerminalSink {
    /// `urls[i]` labels task `i`; bars are drawn through `multi`.
    pub(crate) fn new(multi: MultiProgress, urls: &[String]) -> Self {
        Self {
            multi,
            labels: urls.iter().map(|url| label_for(url)).collect(),
            bars: HashMap::new(),
        }
    }

    fn label(&self, index: usize) -> String {
        self.labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{index}"))
    }

    fn bar(&mut self, index: usize) -> &ProgressBar {
        if !self.bars.contains_key(&index) {
            let bar = self.multi.add(ProgressBar::new(100));
            bar.set_style(percent_style());
            bar.set_prefix(self.label(index));
            self.bars.insert(index, bar);
        }
        &self.bars[&index]
    }
}

impl ProgressSink for TerminalSink {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn on_progress(&mut self, index: usize, percent: f64) {
        let bar = self.bar(index);
        bar.set_style(percent_style());
        bar.set_position(percent.round() as u64);
    }

    fn on_error(&mut self, index: usize, message: &str) {
        let line = format!("{}: {message}", self.label(index));
        // println fails only when stderr is gone; the tracing event still records it.
        let _ = self.multi.println(line);
        tracing::debug!(index, error = %message, "attempt failure shown");
    }

    fn on_bytes(&mut self, index: usize, bytes: u64) {
        let bar = self.bar(index);
        bar.set_style(bytes_style());
        bar.set_message(HumanBytes(bytes).to_string());
        bar.tick();
    }

    fn on_finished(&mut self, index: usize, outcome: TransferOutcome) {
        let bar = self.bar(index);
        match outcome {
            TransferOutcome::Completed => bar.finish_with_message("done"),
            TransferOutcome::Abandoned => bar.abandon_with_message("abandoned"),
        }
    }
}

fn percent_style() -> ProgressStyle {
    ProgressStyle::with_template(PERCENT_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn bytes_style() -> ProgressStyle {
    ProgressStyle::with_template(BYTES_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["-", "\\", "|", "/", " "])
}

fn label_for(url: &str) -> String {
    const MAX: usize = 24;
    let name = filename_for_url(url);
    if name.chars().count() <= MAX {
        name
    } else {
        let skip = name.chars().count() - (MAX - 1);
        let tail: String = name.chars().skip(skip).collect();
        format!("…{tail}")
    }
}
