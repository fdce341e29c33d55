//! Shell commands: the dispatch keys the grammar's canonical names map to.

use crate::internal::grammar::{CompiledGrammar, GrammarError, GrammarResult, TokenRegistry, tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Plugins,
    Quit,
    Say,
    Irc,
    Help,
    Operate,
    Sudoers,
    Debug,
    Save,
}

impl Command {
    /// Map a canonical command name (a command token-set name) to its handler.
    pub fn from_name(name: &str) -> Option<Self> {
        Command::all().into_iter().find(|cmd| cmd.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Plugins => tokens::PLUGINS,
            Command::Quit => tokens::QUIT,
            Command::Say => tokens::SAY,
            Command::Irc => tokens::IRC,
            Command::Help => tokens::HELP,
            Command::Operate => tokens::OPERATE,
            Command::Sudoers => tokens::SUDOERS,
            Command::Debug => tokens::DEBUG,
            Command::Save => tokens::SAVE,
        }
    }

    /// What follows the command word.
    pub fn usage(&self) -> &'static str {
        match self {
            Command::Plugins => "ls | print | add <ids> | del <ids>",
            Command::Sudoers => "add <nick> | del <nick>",
            Command::Irc => "<n>",
            Command::Say => "<text>",
            Command::Quit | Command::Help | Command::Operate | Command::Debug | Command::Save => "",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Plugins => "list, activate or deactivate plugins",
            Command::Quit => "save plugin data, disconnect and leave",
            Command::Say => "say something on the channel",
            Command::Irc => "show the last n messages of the channel",
            Command::Help => "show this help",
            Command::Operate => "gold ledger operations",
            Command::Sudoers => "grant or revoke sudo",
            Command::Debug => "dump plugin internals",
            Command::Save => "save plugin data",
        }
    }

    pub fn all() -> Vec<Command> {
        vec![
            Command::Quit,
            Command::Plugins,
            Command::Sudoers,
            Command::Irc,
            Command::Say,
            Command::Help,
            Command::Save,
            Command::Operate,
            Command::Debug,
        ]
    }
}

/// Fail if the grammar accepts a command no handler exists for.
pub fn check_routes(grammar: &CompiledGrammar) -> GrammarResult<()> {
    match grammar
        .commands()
        .into_iter()
        .find(|name| Command::from_name(name).is_none())
    {
        Some(name) => Err(GrammarError::UnroutedCommand(name.to_string())),
        None => Ok(()),
    }
}

/// Help text listing every command with its spellings.
pub fn help_text(registry: &TokenRegistry) -> String {
    let mut lines = vec!["Commands:".to_string()];
    for command in Command::all() {
        let spellings = registry
            .token_set(command.name())
            .map(|set| set.spellings().join("|"))
            .unwrap_or_else(|_| command.name().to_string());
        let synopsis = if command.usage().is_empty() {
            spellings
        } else {
            format!("{spellings} {}", command.usage())
        };
        lines.push(format!("  {synopsis:<60} {}", command.description()));
    }
    lines.join("\n")
}
