//! Error types for dcc-build.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for dcc-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while recording an invocation.
#[derive(Error, Diagnostic, Debug)]
pub enum BuildError {
    /// The current working directory could not be resolved.
    #[error("could not get current working directory")]
    #[diagnostic(code(dcc::working_directory))]
    WorkingDirectory(#[source] std::io::Error),

    /// The working directory cannot be stored in a UTF-8 database.
    #[error("current working directory is not valid UTF-8: {0:?}")]
    #[diagnostic(code(dcc::working_directory))]
    NonUtf8WorkingDirectory(PathBuf),

    /// A compiler argument cannot be stored in a UTF-8 database.
    #[error("compiler argument is not valid UTF-8: {0:?}")]
    #[diagnostic(
        code(dcc::non_utf8_argument),
        help("the compiler is still invoked; only the database update was skipped")
    )]
    NonUtf8Argument(std::ffi::OsString),

    /// Failed to open, read or create the database (or its lock file).
    #[error("could not open {}", path.display())]
    #[diagnostic(
        code(dcc::database_open),
        help("the compiler is still invoked; only the database update was skipped")
    )]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The existing database is not a valid compilation database.
    #[error("could not parse {}", path.display())]
    #[diagnostic(
        code(dcc::database_parse),
        help("the file was left untouched; fix or remove it to resume recording")
    )]
    DatabaseParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write the merged database back.
    #[error("could not write {}", path.display())]
    #[diagnostic(code(dcc::database_write))]
    DatabaseWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the merged database.
    #[error("could not serialize compilation database")]
    #[diagnostic(code(dcc::database_write))]
    Serialize(#[from] serde_json::Error),

    /// An entry for the same file was recorded from another directory.
    #[error(
        "{} is already recorded from directory {}, not {}",
        file.display(),
        recorded.display(),
        current.display()
    )]
    #[diagnostic(
        code(dcc::directory_mismatch),
        help("the database may belong to another build tree; set `on_directory_mismatch` in dcc.toml to change how this is handled")
    )]
    DirectoryMismatch {
        file: PathBuf,
        recorded: PathBuf,
        current: PathBuf,
    },

    /// Failed to read the configuration file.
    #[error("failed to read config file {}", path.display())]
    #[diagnostic(code(dcc::config))]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse TOML config {}", path.display())]
    #[diagnostic(code(dcc::config))]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl BuildError {
    pub fn is_directory_mismatch(&self) -> bool {
        matches!(self, BuildError::DirectoryMismatch { .. })
    }
}
