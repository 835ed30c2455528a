//! Compilation database recording for the dcc compiler wrapper.
//!
//! This crate provides:
//! - The flag table and argument classifier that pick source files out of a
//!   compiler command line
//! - Source path normalization against the captured working directory
//! - compile_commands.json merging, with in-place updates and locking
//! - Wrapper configuration (`dcc.toml`)
//!
//! # Architecture
//!
//! ```text
//! args → Classifier → source files → WorkingDirectory::absolutize
//!                                          ↓
//!      Invocation::command_line → CompileCommands::merge → compile_commands.json
//! ```
//!
//! # Example
//!
//! ```toml
//! # <database-dir>/dcc.toml
//! [database]
//! lock = true
//! on_directory_mismatch = "report"
//!
//! [flags]
//! extra = [{ flag = "-Xclang", arity = 1 }]
//! exclude = ["/dev/zero"]
//! ```

mod classify;
mod compile_commands;
mod config;
mod error;
mod flags;
mod invocation;
mod lock;
mod path;
mod record;

pub use classify::{Classified, Classifier, TokenClass};
pub use compile_commands::{CompileCommand, CompileCommands, MergeAction, MergeSummary};
pub use config::{Config, DatabaseConfig, FlagsConfig, MismatchPolicy, CONFIG_FILE_NAME};
pub use error::{BuildError, Result};
pub use flags::{match_flag, FlagMatch, FlagSpec, BUILTIN_EXCLUDES, BUILTIN_FLAGS};
pub use invocation::{Invocation, DATABASE_FILE_NAME};
pub use lock::DatabaseLock;
pub use path::WorkingDirectory;
pub use record::{record, RecordOutcome};
