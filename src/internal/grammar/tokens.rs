//! Token-set registry: every spelling the shell accepts, keyed by logical name.
//!
//! A token set is either a list of interchangeable literals (`q`, `quit`,
//! `:q`, `exit`) or a single regex fragment (`[a-zA-Z0-9_-]+`). Command specs
//! refer to token sets by name only; the compiler resolves them here.

use std::collections::HashMap;

use super::error::{GrammarError, GrammarResult};

pub const QUIT: &str = "quit";
pub const PLUGINS: &str = "plugins";
pub const SUDOERS: &str = "sudoers";
pub const IRC: &str = "irc";
pub const SAY: &str = "say";
pub const HELP: &str = "help";
pub const SAVE: &str = "save";
pub const OPERATE: &str = "operate";
pub const DEBUG: &str = "debug";

pub const PLUGINS_ADD: &str = "pgadd";
pub const PLUGINS_DEL: &str = "pgdel";
pub const PLUGINS_LS: &str = "pgls";
pub const PLUGINS_PRINT: &str = "pgprint";
pub const SUDO_ADD: &str = "sudoadd";
pub const SUDO_DEL: &str = "sudodel";

/// Plugin subcommands that take ids.
pub const SUB_PLUGINS_ARG: &str = "subpgarg";
/// Plugin subcommands that take nothing.
pub const SUB_PLUGINS_NOARG: &str = "subpgnoa";
pub const SUB_SUDOERS: &str = "subsudos";
pub const ARGS: &str = "args";
pub const NICK: &str = "nick";

const SPELL_QUIT: &[&str] = &["q", "quit", ":q", "exit"];
const SPELL_PLUGINS: &[&str] = &["plugins", "plugin", "pg", "pl", "plg"];
const SPELL_SUDOERS: &[&str] = &["sudoers", "sudoer", "sudo", "su", "sd"];
const SPELL_IRC: &[&str] = &["irc", "lastwords", "words", "last", "lw", "w", "wl"];
const SPELL_SAY: &[&str] = &["say"];
const SPELL_HELP: &[&str] = &["help", "h"];
const SPELL_SAVE: &[&str] = &["save", "save data", "datasave"];
const SPELL_OPERATE: &[&str] = &["op", "operate"];
const SPELL_DEBUG: &[&str] = &["debug", "dbg"];

const SPELL_PLUGINS_ADD: &[&str] = &["add", "a", "activate"];
const SPELL_PLUGINS_DEL: &[&str] = &["deactivate", "del", "d", "rm", "r"];
const SPELL_PLUGINS_LS: &[&str] = &["ls", "l"];
const SPELL_PLUGINS_PRINT: &[&str] = &["p", "print"];
const SPELL_SUDO_ADD: &[&str] = &["a", "add"];
const SPELL_SUDO_DEL: &[&str] = &["d", "del", "rm"];

/// A named group of interchangeable spellings for one semantic token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSet {
    /// Literal spellings, matched verbatim.
    Literals(Vec<String>),
    /// A raw regex fragment.
    Pattern(String),
}

impl TokenSet {
    /// Build a literal token set, keeping the given order.
    pub fn literals<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TokenSet::Literals(items.into_iter().map(Into::into).collect())
    }

    /// Build a token set from a regex fragment.
    pub fn pattern(fragment: impl Into<String>) -> Self {
        TokenSet::Pattern(fragment.into())
    }

    /// The regex alternation body for this set. Literals are escaped.
    pub fn to_regex(&self) -> String {
        match self {
            TokenSet::Literals(items) => items
                .iter()
                .map(|item| regex::escape(item))
                .collect::<Vec<_>>()
                .join("|"),
            TokenSet::Pattern(fragment) => fragment.clone(),
        }
    }

    /// Literal spellings of this set; empty for pattern sets.
    pub fn spellings(&self) -> &[String] {
        match self {
            TokenSet::Literals(items) => items,
            TokenSet::Pattern(_) => &[],
        }
    }

    /// Whether `text` is one of the literal spellings.
    ///
    /// Pattern sets never contain anything: membership is only meaningful for
    /// the literal families Control routes on.
    pub fn contains(&self, text: &str) -> bool {
        self.spellings().iter().any(|item| item == text)
    }
}

/// Table of token sets keyed by logical name.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    sets: HashMap<String, TokenSet>,
}

impl TokenRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
        }
    }

    /// Declare (or redeclare) a token set under `name`.
    pub fn declare(&mut self, name: impl Into<String>, set: TokenSet) -> &mut Self {
        let name = name.into();
        if self.sets.insert(name.clone(), set).is_some() {
            tracing::warn!("Overwriting token set: {name}");
        }
        self
    }

    /// Look up a token set by name.
    pub fn token_set(&self, name: &str) -> GrammarResult<&TokenSet> {
        self.sets
            .get(name)
            .ok_or_else(|| GrammarError::UnknownTokenSet(name.to_string()))
    }

    /// Whether the set called `name` lists `text` among its spellings.
    /// Unknown names contain nothing.
    pub fn contains(&self, name: &str, text: &str) -> bool {
        self.sets.get(name).is_some_and(|set| set.contains(text))
    }
}

impl Default for TokenRegistry {
    /// The shell's own vocabulary.
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .declare(QUIT, TokenSet::literals(SPELL_QUIT.iter().copied()))
            .declare(PLUGINS, TokenSet::literals(SPELL_PLUGINS.iter().copied()))
            .declare(SUDOERS, TokenSet::literals(SPELL_SUDOERS.iter().copied()))
            .declare(IRC, TokenSet::literals(SPELL_IRC.iter().copied()))
            .declare(SAY, TokenSet::literals(SPELL_SAY.iter().copied()))
            .declare(
                PLUGINS_ADD,
                TokenSet::literals(SPELL_PLUGINS_ADD.iter().copied()),
            )
            .declare(
                PLUGINS_DEL,
                TokenSet::literals(SPELL_PLUGINS_DEL.iter().copied()),
            )
            .declare(
                PLUGINS_LS,
                TokenSet::literals(SPELL_PLUGINS_LS.iter().copied()),
            )
            .declare(
                PLUGINS_PRINT,
                TokenSet::literals(SPELL_PLUGINS_PRINT.iter().copied()),
            )
            .declare(SUDO_ADD, TokenSet::literals(SPELL_SUDO_ADD.iter().copied()))
            .declare(SUDO_DEL, TokenSet::literals(SPELL_SUDO_DEL.iter().copied()))
            .declare(
                SUB_PLUGINS_ARG,
                TokenSet::literals(SPELL_PLUGINS_ADD.iter().chain(SPELL_PLUGINS_DEL).copied()),
            )
            .declare(
                SUB_PLUGINS_NOARG,
                TokenSet::literals(SPELL_PLUGINS_PRINT.iter().chain(SPELL_PLUGINS_LS).copied()),
            )
            .declare(
                SUB_SUDOERS,
                TokenSet::literals(SPELL_SUDO_ADD.iter().chain(SPELL_SUDO_DEL).copied()),
            )
            .declare(ARGS, TokenSet::pattern(".*"))
            .declare(NICK, TokenSet::pattern("[a-zA-Z0-9_-]+"))
            .declare(HELP, TokenSet::literals(SPELL_HELP.iter().copied()))
            .declare(SAVE, TokenSet::literals(SPELL_SAVE.iter().copied()))
            .declare(OPERATE, TokenSet::literals(SPELL_OPERATE.iter().copied()))
            .declare(DEBUG, TokenSet::literals(SPELL_DEBUG.iter().copied()));
        registry
    }
}
