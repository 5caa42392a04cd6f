//! Runtime configuration.
//!
//! # Responsibility
//! - Describe store location, logging and remote-sync settings.
//! - Load them from an optional TOML file with defaults for every field.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - Validated configs have a non-empty sync URL and sync durations in
//!   `1..=MAX_SYNC_DURATION_SECS`.

use crate::sync::merge::MergeStrategy;
use crate::sync::remote::RemoteFormat;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_SYNC_URL: &str = "https://jsonplaceholder.typicode.com/posts";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 10;
/// Upper bound for sync interval and timeout: one year.
pub const MAX_SYNC_DURATION_SECS: u64 = 86_400 * 365;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "config_io_failed",
            Self::Parse(_) => "config_parse_failed",
            Self::Invalid(_) => "config_invalid",
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::Invalid(details) => write!(f, "invalid config value: {details}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotebookConfig {
    /// SQLite file for the persisted snapshot. In-memory when absent.
    pub db_path: Option<PathBuf>,
    /// One of `trace|debug|info|warn|error`. Build-mode default when absent.
    pub log_level: Option<String>,
    /// Absolute directory for rolling logs. Logging stays off when absent.
    pub log_dir: Option<PathBuf>,
    pub sync: SyncConfig,
}

/// Remote mirror settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub enabled: bool,
    pub url: String,
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub strategy: MergeStrategy,
    pub remote_format: RemoteFormat,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_SYNC_URL.to_string(),
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            timeout_secs: DEFAULT_SYNC_TIMEOUT_SECS,
            strategy: MergeStrategy::default(),
            remote_format: RemoteFormat::default(),
        }
    }
}

impl QuotebookConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads config from `path`; defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.url.trim().is_empty() {
            return Err(ConfigError::Invalid("sync.url cannot be empty".to_string()));
        }
        check_duration("sync.interval_secs", self.sync.interval_secs)?;
        check_duration("sync.timeout_secs", self.sync.timeout_secs)?;
        Ok(())
    }
}

fn check_duration(field: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 || secs > MAX_SYNC_DURATION_SECS {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_SYNC_DURATION_SECS}, got {secs}"
        )));
    }
    Ok(())
}
