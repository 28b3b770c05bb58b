//! Per-session destination assignment.
//!
//! Every queue item gets a file of its own. An item whose URL filename is
//! unique in the session keeps it unchanged; items that share a filename
//! (same basename on different hosts or paths, or the same URL twice) are
//! written to `<stem>-<index><ext>` instead, e.g. `data-1.bin`. Indices come
//! from submission order, so rerunning the same URL list maps every item to
//! the file it used before and resumption still lines up.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use super::filename::filename_for_url;
use crate::queue::QueueItem;

/// Filename claims for one session, keyed by queue index.
#[derive(Debug)]
pub(crate) struct Destinations {
    output_dir: PathBuf,
    state: Mutex<Claims>,
}

#[derive(Debug, Default)]
struct Claims {
    by_index: HashMap<usize, String>,
    taken: HashSet<String>,
}

impl Claims {
    /// Claims `candidate`, or an index-suffixed variant of `base` if it is taken.
    fn claim(&mut self, index: usize, base: &str, candidate: String) -> String {
        let mut name = candidate;
        let mut round = 0usize;
        while self.taken.contains(&name) {
            round += 1;
            let suffix = if round == 1 {
                index.to_string()
            } else {
                format!("{index}-{round}")
            };
            name = indexed_name(base, &suffix);
        }
        self.taken.insert(name.clone());
        self.by_index.insert(index, name.clone());
        name
    }
}

impl Destinations {
    pub(crate) fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            state: Mutex::new(Claims::default()),
        }
    }

    /// Assigns a file to every item up front.
    ///
    /// Items are visited in index order, so the result does not depend on
    /// which worker later picks which item.
    pub(crate) fn plan(&self, items: &[QueueItem]) {
        let mut ordered: Vec<(usize, String)> = items
            .iter()
            .map(|item| (item.index, filename_for_url(item.url())))
            .collect();
        ordered.sort_by_key(|(index, _)| *index);

        let mut shared: HashMap<&str, usize> = HashMap::new();
        for (_, name) in &ordered {
            *shared.entry(name.as_str()).or_default() += 1;
        }

        let mut claims = self.lock();
        for (index, name) in &ordered {
            let count = shared.get(name.as_str()).copied().unwrap_or(1);
            let candidate = if count > 1 {
                indexed_name(name, &index.to_string())
            } else {
                name.clone()
            };
            let assigned = claims.claim(*index, name, candidate);
            if count > 1 {
                info!(
                    index,
                    count,
                    filename = %name,
                    assigned = %assigned,
                    "filename shared; using indexed destination"
                );
            }
        }
    }

    /// Destination for `item`; items submitted after [`plan`](Self::plan) are
    /// assigned on first use and never take a file already claimed.
    pub(crate) fn resolve(&self, item: &QueueItem) -> PathBuf {
        let mut claims = self.lock();
        if let Some(name) = claims.by_index.get(&item.index) {
            return self.output_dir.join(name);
        }
        let name = filename_for_url(item.url());
        let assigned = claims.claim(item.index, &name, name.clone());
        debug!(index = item.index, filename = %assigned, "destination assigned");
        self.output_dir.join(assigned)
    }

    /// Directory every destination lives in.
    pub(crate) fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn lock(&self) -> MutexGuard<'_, Claims> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Inserts `-<suffix>` before the first extension: `data.tar.gz` -> `data-3.tar.gz`.
fn indexed_name(name: &str, suffix: &str) -> String {
    // A leading dot marks a hidden file, not an extension.
    match name.char_indices().skip(1).find(|(_, c)| *c == '.') {
        Some((dot, _)) => format!("{}-{suffix}{}", &name[..dot], &name[dot..]),
        None => format!("{name}-{suffix}"),
    }
}
