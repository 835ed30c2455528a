//! compile_commands.json loading, merging and persisting.
//!
//! The database is always handled as structured data: parsed into
//! [`CompileCommands`], modified in place, then serialized and swapped in
//! as a whole.

use crate::config::MismatchPolicy;
use crate::path::WorkingDirectory;
use crate::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A single compile command from compile_commands.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// The working directory for compilation.
    pub directory: PathBuf,

    /// The source file path.
    pub file: PathBuf,

    /// The full compilation command (space-separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// The compilation arguments (array form), as written by other tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,

    /// Output file, as written by other tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Any other keys, kept so foreign entries survive a rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CompileCommand {
    /// Create an entry with exactly `directory`, `file` and `command`.
    pub fn new(directory: impl Into<PathBuf>, file: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file: file.into(),
            command: Some(command.into()),
            arguments: None,
            output: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Replace the recorded command. A stale `arguments` array would take
    /// precedence over `command` for most consumers, so it is dropped.
    fn set_command(&mut self, command: &str) {
        self.command = Some(command.to_string());
        self.arguments = None;
    }
}

/// What happened to a single source file during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// A new entry was appended.
    Added,
    /// An existing entry's command was overwritten in place.
    Updated,
    /// An existing entry from another directory was left alone.
    Skipped,
}

/// Counts of merge actions for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl MergeSummary {
    fn count(&mut self, action: MergeAction) {
        match action {
            MergeAction::Added => self.added += 1,
            MergeAction::Updated => self.updated += 1,
            MergeAction::Skipped => self.skipped += 1,
        }
    }

    /// Whether the collection changed and needs to be written back.
    pub fn changed(&self) -> bool {
        self.added + self.updated > 0
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.as_os_str() == b.as_os_str()
}

/// Collection of compile commands (from compile_commands.json).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileCommands {
    commands: Vec<CompileCommand>,
}

impl FromStr for CompileCommands {
    type Err = serde_json::Error;

    /// Parse compile commands from a JSON string. Blank input is an empty
    /// database (e.g. a file created with `touch`).
    fn from_str(json: &str) -> std::result::Result<Self, Self::Err> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let commands: Vec<CompileCommand> = serde_json::from_str(json)?;
        Ok(Self { commands })
    }
}

impl CompileCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load compile commands from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::DatabaseOpen {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse().map_err(|source| BuildError::DatabaseParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the database at `path`, or start an empty one if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::debug!("{} does not exist yet, starting empty", path.display());
            Ok(Self::default())
        }
    }

    /// Get all compile commands.
    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Find the compile command for a specific (absolute) source file.
    ///
    /// Paths are compared as exact strings: `/w/./a.c` and `/w/a.c` are
    /// different files as far as the database is concerned.
    pub fn find_command(&self, file: &Path) -> Option<&CompileCommand> {
        self.commands.iter().find(|cmd| same_path(&cmd.file, file))
    }

    /// Record `command` for `file`, compiled from `cwd`.
    ///
    /// An existing entry for the same file is updated in place, keeping its
    /// position. An existing entry recorded from a different directory is
    /// handled according to `policy`.
    pub fn upsert(
        &mut self,
        file: &Path,
        cwd: &WorkingDirectory,
        command: &str,
        policy: MismatchPolicy,
    ) -> Result<MergeAction> {
        let Some(index) = self.commands.iter().position(|cmd| same_path(&cmd.file, file)) else {
            log::debug!("adding entry for {}", file.display());
            self.commands
                .push(CompileCommand::new(cwd.as_path(), file, command));
            return Ok(MergeAction::Added);
        };

        let existing = &mut self.commands[index];
        if !same_path(&existing.directory, cwd.as_path()) {
            return match policy {
                MismatchPolicy::Skip => {
                    log::warn!(
                        "leaving {} as recorded from {} (current directory is {})",
                        file.display(),
                        existing.directory.display(),
                        cwd.as_str()
                    );
                    Ok(MergeAction::Skipped)
                }
                MismatchPolicy::Report | MismatchPolicy::Abort => Err(BuildError::DirectoryMismatch {
                    file: file.to_path_buf(),
                    recorded: existing.directory.clone(),
                    current: cwd.as_path().to_path_buf(),
                }),
            };
        }

        log::debug!("updating entry for {}", file.display());
        existing.set_command(command);
        Ok(MergeAction::Updated)
    }

    /// Record `command` for every file in `files`.
    ///
    /// On error the collection may be partially modified and must not be
    /// persisted.
    pub fn merge(
        &mut self,
        files: &[PathBuf],
        cwd: &WorkingDirectory,
        command: &str,
        policy: MismatchPolicy,
    ) -> Result<MergeSummary> {
        let mut summary = MergeSummary::default();
        for file in files {
            summary.count(self.upsert(file, cwd, command, policy)?);
        }
        Ok(summary)
    }

    /// Serialize the whole collection as a JSON array.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(&self.commands)?;
        json.push('\n');
        Ok(json)
    }

    /// Replace the file at `path` with this collection.
    ///
    /// The content is written to a temporary file next to `path` and renamed
    /// over it, so readers see either the old or the new document.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |source: std::io::Error| BuildError::DatabaseWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(".compile_commands").suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Requested at creation, so the umask applies as for any new file.
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }

        let mut tmp = builder.tempfile_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        if let Ok(meta) = std::fs::metadata(path) {
            std::fs::set_permissions(tmp.path(), meta.permissions()).map_err(write_err)?;
        }
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}
