//! Replay configuration
//!
//! JSON file, every field optional:
//!
//! ```json
//! {
//!     "storage_dir": "/var/lib/agent",
//!     "max_record_bytes": 16777216,
//!     "log_level": "info"
//! }
//! ```
//!
//! Exactly one of `storage_dir` and `wal_dir` must be set once command
//! line flags are applied.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::recovery::ReplayOptions;
use crate::wal::{sub_directory, DEFAULT_MAX_RECORD_BYTES};

use super::args::SourceArgs;
use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayConfig {
    /// Storage directory; the WAL lives in its `wal` subdirectory
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// WAL directory, used as is
    #[serde(default)]
    pub wal_dir: Option<PathBuf>,

    /// Largest accepted record (optional, default 16 MiB)
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: u32,

    /// Log filter directive (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_record_bytes() -> u32 {
    DEFAULT_MAX_RECORD_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            wal_dir: None,
            max_record_bytes: default_max_record_bytes(),
            log_level: default_log_level(),
        }
    }
}

impl ReplayConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))
    }

    /// Builds the effective configuration from an optional file and flags.
    ///
    /// A directory flag replaces both directory settings of the file.
    pub fn from_args(args: &SourceArgs) -> CliResult<Self> {
        let mut config = match args.config {
            Some(ref path) => Self::read(path)?,
            None => Self::default(),
        };

        if args.wal_dir.is_some() || args.storage_dir.is_some() {
            config.wal_dir = args.wal_dir.clone();
            config.storage_dir = args.storage_dir.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        match (&self.storage_dir, &self.wal_dir) {
            (Some(_), Some(_)) => {
                return Err(CliError::config_error(
                    "storage_dir and wal_dir are mutually exclusive",
                ))
            }
            (None, None) => {
                return Err(CliError::config_error(
                    "One of storage_dir or wal_dir is required",
                ))
            }
            _ => {}
        }

        if self.max_record_bytes == 0 {
            return Err(CliError::config_error("max_record_bytes must be > 0"));
        }

        EnvFilter::try_new(&self.log_level).map_err(|e| {
            CliError::config_error(format!("Invalid log_level '{}': {}", self.log_level, e))
        })?;

        Ok(())
    }

    /// WAL directory to replay
    pub fn wal_path(&self) -> PathBuf {
        match (&self.wal_dir, &self.storage_dir) {
            (Some(wal_dir), _) => wal_dir.clone(),
            (None, Some(storage_dir)) => sub_directory(storage_dir),
            (None, None) => PathBuf::new(),
        }
    }

    /// Library options derived from this configuration
    pub fn replay_options(&self) -> ReplayOptions {
        ReplayOptions {
            max_record_bytes: self.max_record_bytes,
        }
    }
}
