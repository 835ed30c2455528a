//! Working directory capture and source path normalization.

use crate::{BuildError, Result};
use std::path::{Path, PathBuf};

/// The absolute working directory, captured once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory {
    path: String,
}

impl WorkingDirectory {
    /// Capture the process working directory.
    pub fn capture() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(BuildError::WorkingDirectory)?;
        Self::from_path(cwd)
    }

    /// Use an explicit directory (which must be absolute UTF-8).
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_absolute() {
            return Err(BuildError::WorkingDirectory(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not an absolute path", path.display()),
            )));
        }
        match path.into_os_string().into_string() {
            Ok(path) => Ok(Self { path }),
            Err(raw) => Err(BuildError::NonUtf8WorkingDirectory(raw.into())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.path)
    }

    /// Make a source-file candidate absolute.
    ///
    /// Candidates starting with `/` are kept as they are; anything else is
    /// appended to the working directory verbatim, without folding `.` or `..`.
    pub fn absolutize(&self, candidate: &str) -> PathBuf {
        if candidate.starts_with('/') {
            PathBuf::from(candidate)
        } else {
            PathBuf::from(format!("{}/{}", self.path, candidate))
        }
    }
}
