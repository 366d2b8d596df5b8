//! Configuration for opening a tablefs database.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [database]
//! path = "tablefs.db"          # ":memory:" for an in-memory database
//! busy_timeout_ms = 5000
//! journal_mode = "wal"
//!
//! [defaults]
//! file_perm = 0o644
//! dir_perm = 0o755
//! ```
//!
//! Every field is optional; missing ones take the [`Default`] values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::vfs::{DEFAULT_DIR_PERM, DEFAULT_FILE_PERM};

/// Path value that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// SQLite journal modes accepted by `PRAGMA journal_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Leave SQLite's default untouched.
    Default,
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

/// Where the record table lives and how the connection is tuned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    pub journal_mode: JournalMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tablefs.db"),
            busy_timeout_ms: 5000,
            journal_mode: JournalMode::Wal,
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }
}

/// Permissions applied by front ends that create entries on a caller's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub file_perm: u32,
    pub dir_perm: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            file_perm: DEFAULT_FILE_PERM,
            dir_perm: DEFAULT_DIR_PERM,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFsConfig {
    pub database: DatabaseConfig,
    pub defaults: DefaultsConfig,
}

impl TableFsConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
