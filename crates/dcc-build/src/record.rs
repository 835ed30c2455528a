//! Recording one invocation into its compilation database.

use crate::compile_commands::{CompileCommands, MergeSummary};
use crate::config::Config;
use crate::invocation::Invocation;
use crate::lock::DatabaseLock;
use crate::path::WorkingDirectory;
use crate::Result;
use std::path::PathBuf;

/// Result of a successful [`record`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// No source files were found; the database was not touched.
    NoSources,
    /// The database was merged (and rewritten if anything changed).
    Recorded {
        files: Vec<PathBuf>,
        summary: MergeSummary,
    },
}

/// Classify the invocation's arguments and merge its source files into the
/// database, under the database lock unless disabled by `config`.
///
/// Nothing is written when an error is returned.
pub fn record(invocation: &Invocation, cwd: &WorkingDirectory, config: &Config) -> Result<RecordOutcome> {
    let sources = config.classifier().source_files(&invocation.args);
    if sources.is_empty() {
        log::debug!("no source files in `{}`", invocation.command_line());
        return Ok(RecordOutcome::NoSources);
    }

    let files: Vec<PathBuf> = sources.iter().map(|s| cwd.absolutize(s)).collect();
    let command = invocation.command_line();
    let path = invocation.database_path();
    log::debug!("recording {} source file(s) into {}", files.len(), path.display());

    let _lock = if config.database.lock {
        Some(DatabaseLock::acquire(&path)?)
    } else {
        None
    };

    let mut database = CompileCommands::load_or_default(&path)?;
    let summary = database.merge(&files, cwd, &command, config.database.on_directory_mismatch)?;
    if summary.changed() {
        database.persist(&path)?;
    }

    Ok(RecordOutcome::Recorded { files, summary })
}
