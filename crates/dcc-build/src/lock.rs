//! Advisory file lock serializing concurrent database updates.
//!
//! Build systems start many wrapper processes at once, all targeting the same
//! database. Each one holds an exclusive `flock` on a sidecar lock file for its
//! whole read-merge-write cycle. The lock is released when the guard is dropped
//! or the process exits. The lock file itself is never removed.

use crate::{BuildError, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Held exclusive lock on a database.
#[derive(Debug)]
pub struct DatabaseLock {
    file: File,
    path: PathBuf,
}

impl DatabaseLock {
    /// Lock file path for a database file.
    pub fn path_for(database: &Path) -> PathBuf {
        let mut name = database.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Block until the lock for `database` is held.
    pub fn acquire(database: &Path) -> Result<Self> {
        let path = Self::path_for(database);
        let open_err = |source: std::io::Error| BuildError::DatabaseOpen {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(open_err)?;
        log::trace!("waiting for {}", path.display());
        sys::lock_exclusive(&file).map_err(open_err)?;
        log::trace!("acquired {}", path.display());

        Ok(Self { file, path })
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        if let Err(e) = sys::unlock(&self.file) {
            log::debug!("failed to unlock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(unix)]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
        loop {
            let ret = unsafe { libc::flock(file.as_raw_fd(), operation) };
            if ret == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    pub fn lock_exclusive(file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_EX)
    }

    pub fn unlock(file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_UN)
    }
}

// No advisory locking outside Unix; concurrent updates may race there.
#[cfg(not(unix))]
mod sys {
    use std::fs::File;
    use std::io;

    pub fn lock_exclusive(_file: &File) -> io::Result<()> {
        Ok(())
    }

    pub fn unlock(_file: &File) -> io::Result<()> {
        Ok(())
    }
}
