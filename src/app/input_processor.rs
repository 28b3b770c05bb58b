//! Input gathering: positional URLs or newline-separated stdin.

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result};

/// Returns the URLs to transfer; reads stdin only when no arguments were given
/// and stdin is not a terminal.
pub(crate) fn collect_urls(args_urls: &[String]) -> Result<Vec<String>> {
    if !args_urls.is_empty() {
        return Ok(parse_url_lines(&args_urls.join("\n")));
    }
    if io::stdin().is_terminal() {
        return Ok(Vec::new());
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read URLs from stdin")?;
    Ok(parse_url_lines(&buffer))
}

/// One URL per line; blank lines and `#` comments are skipped.
pub(crate) fn parse_url_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
