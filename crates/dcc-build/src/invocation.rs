//! A wrapped compiler invocation and its recorded command string.

use crate::{BuildError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Database file name inside the database directory.
pub const DATABASE_FILE_NAME: &str = "compile_commands.json";

/// One call of the wrapper: where to record, what to run, and with what.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Directory holding `compile_commands.json`.
    pub database_dir: PathBuf,

    /// The real compiler executable, as given on the command line.
    pub compiler: String,

    /// Everything after the compiler name, forwarded verbatim.
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(database_dir: impl Into<PathBuf>, compiler: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            database_dir: database_dir.into(),
            compiler: compiler.into(),
            args,
        }
    }

    /// Build an invocation from raw command-line arguments.
    ///
    /// The database only holds UTF-8, so any token that is not valid UTF-8
    /// makes the invocation unrecordable.
    pub fn from_os(database_dir: impl Into<PathBuf>, compiler: OsString, args: Vec<OsString>) -> Result<Self> {
        let compiler = compiler.into_string().map_err(BuildError::NonUtf8Argument)?;
        let args = args
            .into_iter()
            .map(|arg| arg.into_string().map_err(BuildError::NonUtf8Argument))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(database_dir, compiler, args))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_dir.join(DATABASE_FILE_NAME)
    }

    pub fn database_dir(&self) -> &Path {
        &self.database_dir
    }

    /// The command string stored with each entry.
    ///
    /// Tokens are joined with single spaces and never quoted, so a token
    /// containing a space cannot be told apart from two tokens. Tools
    /// already consuming these databases rely on this exact format.
    pub fn command_line(&self) -> String {
        std::iter::once(self.compiler.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
