//! Terminal capability checks and tracing setup.

use std::io::{self, Write};

use indicatif::MultiProgress;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_disable_color(
    no_color_flag: bool,
    no_color_env: bool,
    dumb_terminal: bool,
) -> bool {
    no_color_flag || no_color_env || dumb_terminal
}

pub(crate) fn is_no_color_requested(no_color_flag: bool) -> bool {
    should_disable_color(no_color_flag, no_color_env_requested(), is_dumb_terminal())
}

pub(crate) fn should_show_progress(
    stderr_is_terminal: bool,
    quiet: bool,
    no_progress: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !no_progress && !dumb_terminal
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `default_level`.
///
/// With `bars`, every log line is written while the bars are suspended so
/// it lands above them instead of through them.
pub(crate) fn init_tracing(default_level: &str, no_color: bool, bars: Option<MultiProgress>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let writer = match bars {
        Some(bars) => BoxMakeWriter::new(move || BarSafeStderr { bars: bars.clone() }),
        None => BoxMakeWriter::new(io::stderr),
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}

/// Stderr writer that hides the progress bars for the duration of each write.
struct BarSafeStderr {
    bars: MultiProgress,
}

impl Write for BarSafeStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bars.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_color_disabled_by_any_source() {
        assert!(!should_disable_color(false, false, false));
        assert!(should_disable_color(true, false, false));
        assert!(should_disable_color(false, true, false));
        assert!(should_disable_color(false, false, true));
    }

    #[test]
    fn test_bar_safe_writer_accepts_whole_buffer() {
        let bars = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        let mut writer = BarSafeStderr { bars };
        assert_eq!(writer.write(b"").unwrap(), 0);
        assert!(writer.flush().is_ok());
    }

    #[test]
    fn test_progress_requires_interactive_stderr() {
        assert!(should_show_progress(true, false, false, false));
        assert!(!should_show_progress(false, false, false, false));
        assert!(!should_show_progress(true, true, false, false));
        assert!(!should_show_progress(true, false, true, false));
        assert!(!should_show_progress(true, false, false, true));
    }
}
