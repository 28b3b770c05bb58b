//! Session configuration: validated settings plus optional TOML file defaults.
//!
//! Precedence is CLI flags, then the config file, then built-in defaults.
//! The binary applies the first layer; this module owns the other two.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::download::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BACKOFF_UNIT, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_BACKOFF,
    MAX_CHUNK_SIZE, MIN_CHUNK_SIZE, READ_TIMEOUT_SECS,
};
use crate::download::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DownloadEngine, EngineError, HttpClient,
    RetryPolicy,
};

/// Directory name under the config home.
const CONFIG_DIR_NAME: &str = "transfer-engine";

/// Largest accepted retry limit.
pub const MAX_RETRY_LIMIT: u32 = 10;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("invalid config value for `{key}`: {message}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default output directory.
    pub output_dir: Option<PathBuf>,
    /// Number of workers (1..=100).
    pub concurrency: Option<usize>,
    /// Attempts per resource (1..=10).
    pub max_retries: Option<u32>,
    /// Write/checkpoint granularity in bytes.
    pub chunk_size: Option<usize>,
    /// Backoff unit in milliseconds.
    pub backoff_unit_ms: Option<u64>,
    /// Cap on one backoff wait in seconds.
    pub max_backoff_secs: Option<u64>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for bad syntax, wrong types, or unknown keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Reads and parses `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/transfer-engine/config.toml`
/// 2. `$HOME/.config/transfer-engine/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present. A missing file is not an error.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but cannot be read or parsed.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(p) if p.exists() => Some(FileConfig::load(p)?),
        _ => None,
    };
    debug!(path = ?path, loaded = config.is_some(), "config file resolved");
    Ok(LoadedConfig { path, config })
}

/// Validated settings for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Resources to transfer, in priority order.
    pub urls: Vec<String>,
    /// Directory receiving the files.
    pub output_dir: PathBuf,
    /// Number of workers.
    pub concurrency: usize,
    /// Attempts per resource.
    pub max_retries: u32,
    /// Write/checkpoint granularity in bytes.
    pub chunk_size: usize,
    /// Backoff unit.
    pub backoff_unit: Duration,
    /// Cap on one backoff wait.
    pub max_backoff: Duration,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            output_dir: PathBuf::from("."),
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            max_backoff: DEFAULT_MAX_BACKOFF,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    /// Defaults with the given URLs.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Overlays every key present in `file`.
    #[must_use]
    pub fn with_file_config(mut self, file: &FileConfig) -> Self {
        if let Some(output_dir) = &file.output_dir {
            self.output_dir.clone_from(output_dir);
        }
        if let Some(concurrency) = file.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(max_retries) = file.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(chunk_size) = file.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(ms) = file.backoff_unit_ms {
            self.backoff_unit = Duration::from_millis(ms);
        }
        if let Some(secs) = file.max_backoff_secs {
            self.max_backoff = Duration::from_secs(secs);
        }
        if let Some(secs) = file.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if let Some(secs) = file.read_timeout_secs {
            self.read_timeout_secs = secs;
        }
        self
    }

    /// Checks every value against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.urls.is_empty() {
            return Err(ConfigError::invalid("urls", "at least one URL is required"));
        }
        if !(1..=100).contains(&self.concurrency) {
            return Err(ConfigError::invalid(
                "concurrency",
                format!("{} (expected 1..=100)", self.concurrency),
            ));
        }
        if !(1..=MAX_RETRY_LIMIT).contains(&self.max_retries) {
            return Err(ConfigError::invalid(
                "max_retries",
                format!("{} (expected 1..={MAX_RETRY_LIMIT})", self.max_retries),
            ));
        }
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(ConfigError::invalid(
                "chunk_size",
                format!(
                    "{} (expected {MIN_CHUNK_SIZE}..={MAX_CHUNK_SIZE})",
                    self.chunk_size
                ),
            ));
        }
        if self.max_backoff < self.backoff_unit {
            return Err(ConfigError::invalid(
                "max_backoff_secs",
                "must not be shorter than the backoff unit",
            ));
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }

    /// Retry policy described by this config.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_unit, self.max_backoff, 2.0)
    }

    /// Builds the engine for this session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for out-of-range concurrency or chunk size.
    pub fn engine(&self) -> Result<DownloadEngine, EngineError> {
        DownloadEngine::new(self.concurrency, self.retry_policy())?.with_chunk_size(self.chunk_size)
    }

    /// Builds the HTTP client with this session's timeouts.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot be initialized.
    pub fn http_client(&self) -> Result<HttpClient, reqwest::Error> {
        HttpClient::with_timeouts(self.connect_timeout_secs, self.read_timeout_secs)
    }
}

fn validate_timeout_secs(key: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::invalid(
            key,
            format!("{value} (expected 1..=3600)"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::new(["https://example.com/a"]);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.chunk_size, 8 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_file() {
        let raw = r#"
            output_dir = "/tmp/out"
            concurrency = 4
            max_retries = 5
            chunk_size = 16384
            backoff_unit_ms = 250
            max_backoff_secs = 10
            connect_timeout_secs = 5
            read_timeout_secs = 60
        "#;
        let file = FileConfig::from_toml_str(raw).unwrap();
        assert_eq!(file.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(file.concurrency, Some(4));

        let config = SessionConfig::new(["https://example.com/a"]).with_file_config(&file);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.chunk_size, 16384);
        assert_eq!(config.backoff_unit, Duration::from_millis(250));
        assert_eq!(config.max_backoff, Duration::from_secs(10));
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.read_timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = FileConfig::from_toml_str("concurrency = 3").unwrap();
        let config = SessionConfig::new(["u"]).with_file_config(&file);
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(FileConfig::from_toml_str("rate_limit = 10").is_err());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        assert!(FileConfig::from_toml_str("concurrency = \"many\"").is_err());
    }

    #[test]
    fn test_validate_reports_offending_key() {
        let cases: Vec<(SessionConfig, &str)> = vec![
            (SessionConfig::new(Vec::<String>::new()), "urls"),
            (
                SessionConfig {
                    concurrency: 0,
                    ..SessionConfig::new(["u"])
                },
                "concurrency",
            ),
            (
                SessionConfig {
                    max_retries: 11,
                    ..SessionConfig::new(["u"])
                },
                "max_retries",
            ),
            (
                SessionConfig {
                    chunk_size: 512,
                    ..SessionConfig::new(["u"])
                },
                "chunk_size",
            ),
            (
                SessionConfig {
                    max_backoff: Duration::from_millis(1),
                    ..SessionConfig::new(["u"])
                },
                "max_backoff_secs",
            ),
            (
                SessionConfig {
                    read_timeout_secs: 0,
                    ..SessionConfig::new(["u"])
                },
                "read_timeout_secs",
            ),
        ];

        for (config, expected) in cases {
            match config.validate() {
                Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, expected),
                other => panic!("expected Invalid for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_retry_policy_and_engine_follow_config() {
        let config = SessionConfig {
            concurrency: 7,
            max_retries: 2,
            chunk_size: 2048,
            ..SessionConfig::new(["u"])
        };
        assert_eq!(config.retry_policy().max_attempts(), 2);
        let engine = config.engine().unwrap();
        assert_eq!(engine.concurrency(), 7);
        assert_eq!(engine.chunk_size(), 2048);
    }

    #[test]
    fn test_load_reports_parse_error_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "concurrency = [").unwrap();

        let error = FileConfig::load(&path).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().contains("config.toml"));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let error = FileConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}
