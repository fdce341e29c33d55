//! Error types for grammar construction.

use thiserror::Error;

/// Errors raised while declaring or compiling the command grammar.
///
/// None of these can happen while the shell is reading lines: the grammar is
/// compiled once, before the first prompt.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// A command spec names a token set that was never declared.
    #[error("Unknown token set: {0}")]
    UnknownTokenSet(String),

    /// The assembled pattern was rejected by the regex engine.
    #[error("Invalid grammar pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The grammar accepts a command that no handler is registered for.
    #[error("Command `{0}` has no dispatch entry")]
    UnroutedCommand(String),
}

/// Result type for grammar operations.
pub type GrammarResult<T> = Result<T, GrammarError>;
