//! Operator shell for a running bot.
//!
//! Every input line is matched against the compiled command grammar and
//! routed to a handler; see [`Control`]. Handlers talk to the bot through the
//! [`Bot`](crate::internal::bot::Bot) trait only.

pub mod command;
pub mod error;
pub mod input;
pub mod operate;
pub mod shell;

pub use command::Command;
pub use error::{CommandError, CommandResult, ControlError};
pub use input::{LineReader, ReadLine, ScriptReader, StdinReader};
pub use shell::{Control, ControlOptions, ControlState};

pub const DEFAULT_PROMPT: &str = "?>";
pub const DEFAULT_INTRO: &str = "Welcome to the munin shell. Type help or h to list commands.";

/// Column the `[ACTIVATED]` marker is aligned on in `plugins ls`.
pub const LABEL_WIDTH: usize = 20;
pub const ACTIVATED_FLAG: &str = "\t\t[ACTIVATED]";
