//! User-Agent string sent with every fetch.

/// Default User-Agent for transfer requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("transfer-engine/{version}")
}
