//! Error types for the operator shell.

use thiserror::Error;

use crate::internal::{grammar::GrammarError, plugin::GoldError};

/// Failure of one shell command.
///
/// Everything except [`CommandError::Io`] is reported to the operator as
/// `ERROR: <message>` and the shell keeps going.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The arguments do not have the expected shape.
    #[error("{0}")]
    Argument(String),

    /// The command exists but this shell cannot carry it out.
    #[error("{0}")]
    Unsupported(String),

    /// The gold ledger refused the operation.
    #[error("{0}")]
    Ledger(#[from] GoldError),

    /// Reading from the operator or writing to the terminal failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CommandError {
    pub fn argument(message: impl Into<String>) -> Self {
        CommandError::Argument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        CommandError::Unsupported(message.into())
    }
}

pub type CommandResult<T = ()> = Result<T, CommandError>;

/// Failure of the shell as a whole.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_display() {
        let err = CommandError::argument("need a valid plugin index");
        assert_eq!(err.to_string(), "need a valid plugin index");

        let err: CommandError = GoldError::Insufficient("alice".to_string()).into();
        assert_eq!(err.to_string(), "alice has no gold to give");
    }

    #[test]
    fn test_control_error_from_grammar() {
        let err: ControlError = GrammarError::UnroutedCommand("dance".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Grammar error: Command `dance` has no dispatch entry"
        );
    }
}
