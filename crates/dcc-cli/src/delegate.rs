//! Handing the invocation over to the real compiler.

use miette::Diagnostic;
use std::ffi::{OsStr, OsString};
use std::io;
use std::process::Command;
use thiserror::Error;

/// The real compiler could not be launched.
#[derive(Error, Diagnostic, Debug)]
pub enum DelegateError {
    #[error("compiler `{compiler}` not found")]
    #[diagnostic(code(dcc::delegate::not_found))]
    NotFound {
        compiler: String,
        #[source]
        source: io::Error,
    },

    #[error("compiler `{compiler}` is not executable")]
    #[diagnostic(code(dcc::delegate::permission_denied))]
    PermissionDenied {
        compiler: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch compiler `{compiler}`")]
    #[diagnostic(code(dcc::delegate::launch))]
    Launch {
        compiler: String,
        #[source]
        source: io::Error,
    },
}

impl DelegateError {
    fn from_io(compiler: &OsStr, source: io::Error) -> Self {
        let compiler = compiler.to_string_lossy().into_owned();
        match source.kind() {
            io::ErrorKind::NotFound => DelegateError::NotFound { compiler, source },
            io::ErrorKind::PermissionDenied => DelegateError::PermissionDenied { compiler, source },
            _ => DelegateError::Launch { compiler, source },
        }
    }

    /// Exit status for the wrapper, following the shell's conventions.
    pub fn exit_code(&self) -> i32 {
        match self {
            DelegateError::NotFound { .. } => 127,
            DelegateError::PermissionDenied { .. } => 126,
            DelegateError::Launch { .. } => 1,
        }
    }
}

fn command(compiler: &OsStr, args: &[OsString]) -> Command {
    let mut cmd = Command::new(compiler);
    cmd.args(args);
    cmd
}

/// Replace the current process with the compiler.
///
/// The compiler sees its own name as argument zero followed by the original
/// trailing arguments, byte for byte. Only returns if the compiler could not
/// be executed.
#[cfg(unix)]
pub fn run(compiler: &OsStr, args: &[OsString]) -> Result<i32, DelegateError> {
    use std::os::unix::process::CommandExt;

    let err = command(compiler, args).arg0(compiler).exec();
    Err(DelegateError::from_io(compiler, err))
}

/// Run the compiler as a child and return its exit status.
#[cfg(not(unix))]
pub fn run(compiler: &OsStr, args: &[OsString]) -> Result<i32, DelegateError> {
    let status = command(compiler, args)
        .status()
        .map_err(|e| DelegateError::from_io(compiler, e))?;
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let not_found = DelegateError::from_io(OsStr::new("cc"), io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(not_found.exit_code(), 127);

        let denied = DelegateError::from_io(OsStr::new("cc"), io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied.exit_code(), 126);

        let other = DelegateError::from_io(OsStr::new("cc"), io::Error::from(io::ErrorKind::InvalidInput));
        assert_eq!(other.exit_code(), 1);
        assert_eq!(other.to_string(), "failed to launch compiler `cc`");
    }
}
