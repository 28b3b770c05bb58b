//! Filename derivation for transfers.
//!
//! Resumption is keyed on the destination file alone, so the same URL must
//! always map to the same name: the sanitized last path segment, or a
//! `download_<digest>.bin` name derived from the URL when there is none.

use std::path::{Component, Path};

use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

/// Hex characters of the URL digest used in fallback names.
const FALLBACK_DIGEST_LEN: usize = 12;

/// Derives the on-disk filename for `url`.
#[must_use]
pub fn filename_for_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| filename_from_path(&parsed))
        .unwrap_or_else(|| fallback_filename(url))
}

fn filename_from_path(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
        last.into()
    });
    let name = sanitize_filename(&decoded);
    (!name.trim_matches('_').is_empty()).then_some(name)
}

/// Deterministic `download_<digest>.bin` name for URLs without a usable segment.
fn fallback_filename(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hex: String = digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>()
        .chars()
        .take(FALLBACK_DIGEST_LEN)
        .collect();
    format!("download_{hex}.bin")
}

/// Sanitizes a filename by replacing characters that are invalid on common filesystems.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
