//! Separation of compiler flags from source-file operands.
//!
//! The classifier walks the trailing arguments once. While a flag still has
//! operands pending, every token is consumed as one of them, whatever it looks
//! like. Otherwise a token is either a known flag, an excluded marker, or a
//! source-file candidate.

use crate::flags::{match_flag, FlagSpec, BUILTIN_EXCLUDES, BUILTIN_FLAGS};
use std::borrow::Cow;

/// How a single trailing token was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Matched a flag spec.
    Flag,
    /// Consumed as a value of the preceding flag.
    Operand,
    /// Reserved marker (stdin, null device) dropped from the source list.
    Excluded,
    /// Source-file candidate, not yet absolute.
    Source,
}

/// A token together with its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified<'a> {
    pub token: &'a str,
    pub class: TokenClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    /// Number of operand tokens still owed to the last flag; never zero.
    Skipping(u32),
}

/// Classifier over an ordered flag table and an exclusion list.
#[derive(Debug, Clone)]
pub struct Classifier {
    flags: Vec<FlagSpec>,
    excludes: Vec<Cow<'static, str>>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            flags: BUILTIN_FLAGS.to_vec(),
            excludes: BUILTIN_EXCLUDES.iter().copied().map(Cow::Borrowed).collect(),
        }
    }
}

impl Classifier {
    /// Create a classifier with the built-in flag table and exclusions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the built-in tables.
    ///
    /// `extra` flags are matched before the built-in ones, so they can
    /// override a built-in prefix. `excludes` are added to the reserved
    /// exclusions.
    pub fn with_extensions(extra: &[FlagSpec], excludes: &[String]) -> Self {
        let mut flags = extra.to_vec();
        flags.extend_from_slice(BUILTIN_FLAGS);

        let mut classifier = Self {
            flags,
            ..Self::default()
        };
        classifier
            .excludes
            .extend(excludes.iter().cloned().map(Cow::Owned));
        classifier
    }

    fn is_excluded(&self, token: &str) -> bool {
        self.excludes.iter().any(|e| e == token)
    }

    /// Classify every token in order.
    pub fn classify<'a, S: AsRef<str>>(&self, tokens: &'a [S]) -> Vec<Classified<'a>> {
        let mut state = State::Normal;
        let mut out = Vec::with_capacity(tokens.len());

        for token in tokens {
            let token = token.as_ref();
            let class = match state {
                State::Skipping(n) => {
                    state = if n > 1 {
                        State::Skipping(n - 1)
                    } else {
                        State::Normal
                    };
                    TokenClass::Operand
                }
                State::Normal => match match_flag(token, &self.flags) {
                    Some(m) => {
                        if m.pending() > 0 {
                            state = State::Skipping(m.pending());
                        }
                        TokenClass::Flag
                    }
                    None if self.is_excluded(token) => TokenClass::Excluded,
                    None => TokenClass::Source,
                },
            };
            out.push(Classified { token, class });
        }

        out
    }

    /// Source-file candidates among `tokens`, in order of appearance.
    pub fn source_files<'a, S: AsRef<str>>(&self, tokens: &'a [S]) -> Vec<&'a str> {
        self.classify(tokens)
            .into_iter()
            .filter(|c| c.class == TokenClass::Source)
            .map(|c| c.token)
            .collect()
    }
}
