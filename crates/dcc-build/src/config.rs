//! Wrapper configuration (dcc.toml format).

use crate::classify::Classifier;
use crate::flags::FlagSpec;
use crate::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file name looked up in the database directory.
pub const CONFIG_FILE_NAME: &str = "dcc.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database handling.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Classifier extensions.
    #[serde(default)]
    pub flags: FlagsConfig,
}

/// How the database file is updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Hold an advisory lock across read-modify-write.
    #[serde(default = "default_lock")]
    pub lock: bool,

    /// What to do when a file is already recorded from another directory.
    #[serde(default)]
    pub on_directory_mismatch: MismatchPolicy,
}

fn default_lock() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            lock: default_lock(),
            on_directory_mismatch: MismatchPolicy::default(),
        }
    }
}

/// Handling of an existing entry whose `directory` differs from the
/// current working directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Report the conflict and leave the database unchanged; still compile.
    #[default]
    Report,
    /// Keep the conflicting entry, warn, and merge the remaining files.
    Skip,
    /// Report the conflict and exit without compiling.
    Abort,
}

impl MismatchPolicy {
    /// Whether a mismatch under this policy stops the invocation.
    pub fn is_fatal(self) -> bool {
        self == MismatchPolicy::Abort
    }
}

/// Additions to the built-in flag table and exclusions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagsConfig {
    /// Flags matched before the built-in table.
    #[serde(default)]
    pub extra: Vec<FlagSpec>,

    /// Tokens never treated as source files.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| BuildError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the configuration for a database directory.
    ///
    /// An explicit path must exist. Otherwise `dcc.toml` in `database_dir`
    /// is used if present, and the defaults if not.
    pub fn load(explicit: Option<&Path>, database_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = Self::default_path(database_dir);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn default_path(database_dir: &Path) -> PathBuf {
        database_dir.join(CONFIG_FILE_NAME)
    }

    /// Build the classifier described by this configuration.
    pub fn classifier(&self) -> Classifier {
        Classifier::with_extensions(&self.flags.extra, &self.flags.exclude)
    }
}
