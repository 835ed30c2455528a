//! Known compiler flags and the prefix match rule.
//!
//! Flags are matched as prefixes of a token, in table order. A flag with a
//! non-zero arity consumes that many following tokens, unless its value was
//! attached inline (`-Ifoo`), in which case one fewer token is consumed.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A flag matcher and the number of operand tokens it takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSpec {
    /// Prefix the token has to start with.
    pub flag: Cow<'static, str>,

    /// Number of trailing tokens the flag takes as its value(s).
    pub arity: u32,
}

impl FlagSpec {
    pub const fn new(flag: &'static str, arity: u32) -> Self {
        Self {
            flag: Cow::Borrowed(flag),
            arity,
        }
    }

    /// Create a flag spec with an owned matcher (e.g. from configuration).
    pub fn owned(flag: impl Into<String>, arity: u32) -> Self {
        Self {
            flag: Cow::Owned(flag.into()),
            arity,
        }
    }
}

/// The outcome of matching a token against a flag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagMatch {
    /// Arity of the matched flag.
    pub arity: u32,

    /// Whether the token carried characters past the flag string.
    pub inline: bool,
}

impl FlagMatch {
    /// Number of following tokens this match consumes.
    pub fn pending(&self) -> u32 {
        if self.arity > 0 && self.inline {
            self.arity - 1
        } else {
            self.arity
        }
    }
}

/// Built-in flags, in match order.
pub const BUILTIN_FLAGS: &[FlagSpec] = &[
    // include paths
    FlagSpec::new("-I", 1),
    FlagSpec::new("-include", 1),
    FlagSpec::new("-isystem", 1),
    FlagSpec::new("-nostdinc", 0),
    // warnings
    FlagSpec::new("-W", 0),
    // defines
    FlagSpec::new("-D", 1),
    FlagSpec::new("-U", 1),
    // language
    FlagSpec::new("-std=", 0),
    // output
    FlagSpec::new("-o", 1),
    // link library
    FlagSpec::new("-l", 1),
    FlagSpec::new("-g", 0),
    FlagSpec::new("-c", 0),
    FlagSpec::new("-O", 0),
    FlagSpec::new("-m", 0),
    FlagSpec::new("-f", 0),
    FlagSpec::new("-S", 0),
    FlagSpec::new("-x", 1),
    // version
    FlagSpec::new("-v", 0),
    FlagSpec::new("--version", 0),
    FlagSpec::new("-V", 1),
    FlagSpec::new("-qversion", 0),
    FlagSpec::new("-pg", 0),
    FlagSpec::new("--param=", 0),
    // print
    FlagSpec::new("-print-file-name=", 0),
    FlagSpec::new("-print-search-dirs", 0),
    FlagSpec::new("-print-multi-os-directory", 0),
    FlagSpec::new("-nostdlib", 0),
    // linking
    FlagSpec::new("-shared", 0),
    FlagSpec::new("-static", 0),
    FlagSpec::new("-pipe", 0),
    FlagSpec::new("-pthread", 0),
    // dependency generation
    FlagSpec::new("-MT", 1),
    FlagSpec::new("-MF", 1),
    FlagSpec::new("-M", 0),
    FlagSpec::new("-E", 0),
    FlagSpec::new("-d", 0),
];

/// Tokens that are never source files: the stdin marker and the null device.
pub const BUILTIN_EXCLUDES: &[&str] = &["-", "/dev/null"];

/// Match `token` against `table`, returning the first matching flag.
pub fn match_flag(token: &str, table: &[FlagSpec]) -> Option<FlagMatch> {
    table.iter().find_map(|spec| {
        token.strip_prefix(&*spec.flag).map(|rest| FlagMatch {
            arity: spec.arity,
            inline: !rest.is_empty(),
        })
    })
}
