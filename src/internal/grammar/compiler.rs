//! Grammar compiler: command specs → one anchored regex with named captures.

use std::collections::HashMap;

use regex::Regex;

use super::{
    error::GrammarResult,
    tokens::{self, TokenRegistry},
};

/// Declarative `(command, subcommand, args)` triple, by token-set name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub subcommand: Option<String>,
    pub args: Option<String>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            subcommand: None,
            args: None,
        }
    }

    pub fn with_subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into());
        self
    }

    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = Some(args.into());
        self
    }
}

/// The shell's command layout, in matching priority order.
pub fn default_command_specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new(tokens::QUIT),
        CommandSpec::new(tokens::PLUGINS).with_subcommand(tokens::SUB_PLUGINS_NOARG),
        CommandSpec::new(tokens::PLUGINS)
            .with_subcommand(tokens::SUB_PLUGINS_ARG)
            .with_args(tokens::ARGS),
        CommandSpec::new(tokens::SUDOERS)
            .with_subcommand(tokens::SUB_SUDOERS)
            .with_args(tokens::NICK),
        CommandSpec::new(tokens::IRC).with_args(tokens::ARGS),
        CommandSpec::new(tokens::SAY).with_args(tokens::ARGS),
        CommandSpec::new(tokens::HELP),
        CommandSpec::new(tokens::OPERATE),
        CommandSpec::new(tokens::SAVE),
        CommandSpec::new(tokens::DEBUG),
    ]
}

/// Fields extracted from one matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Canonical command: the name of the command token set that matched.
    pub command: String,
    /// The spelling actually typed.
    pub cmd: String,
    pub subcmd: Option<String>,
    pub args: Option<String>,
}

/// A literal accepted by two different top-level commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub literal: String,
    /// Command that wins (declared first).
    pub winner: String,
    pub shadowed: String,
}

/// Capture-group names of one alternative.
#[derive(Debug, Clone)]
struct Slot {
    command: String,
    cmd: String,
    subcmd: String,
    args: String,
}

/// All command specs compiled into a single full-line matcher.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    regex: Regex,
    slots: Vec<Slot>,
}

impl CompiledGrammar {
    /// Match a raw input line. Only a match of the entire line counts.
    pub fn matches(&self, line: &str) -> Option<MatchResult> {
        let caps = self.regex.captures(line)?;
        self.slots.iter().find_map(|slot| {
            let cmd = caps.name(&slot.cmd)?;
            Some(MatchResult {
                command: slot.command.clone(),
                cmd: cmd.as_str().to_string(),
                subcmd: caps.name(&slot.subcmd).map(|m| m.as_str().to_string()),
                args: caps.name(&slot.args).map(|m| m.as_str().to_string()),
            })
        })
    }

    /// Canonical command names, in declaration order, without repeats.
    pub fn commands(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for slot in &self.slots {
            if !seen.contains(&slot.command.as_str()) {
                seen.push(slot.command.as_str());
            }
        }
        seen
    }
}

/// Turns command specs into a [`CompiledGrammar`].
pub struct GrammarCompiler<'a> {
    registry: &'a TokenRegistry,
}

impl<'a> GrammarCompiler<'a> {
    pub fn new(registry: &'a TokenRegistry) -> Self {
        Self { registry }
    }

    /// Compile `specs` into one ordered alternation.
    ///
    /// Each spec becomes `\s*(cmd)(\s+(subcmd))?(\s+(args))?\s*`, where the
    /// optional segments are present only if the spec declares them, and are
    /// then required. Earlier specs take priority.
    pub fn compile(&self, specs: &[CommandSpec]) -> GrammarResult<CompiledGrammar> {
        let mut alternatives = Vec::with_capacity(specs.len());
        let mut slots = Vec::with_capacity(specs.len());

        for (idx, spec) in specs.iter().enumerate() {
            let slot = Slot {
                command: spec.command.clone(),
                cmd: format!("cmd_{idx}"),
                subcmd: format!("subcmd_{idx}"),
                args: format!("args_{idx}"),
            };

            let mut alternative = format!(
                r"\s*(?P<{}>{})",
                slot.cmd,
                self.alternation(&spec.command)?
            );
            if let Some(subcommand) = &spec.subcommand {
                alternative.push_str(&format!(
                    r"\s+(?P<{}>{})",
                    slot.subcmd,
                    self.alternation(subcommand)?
                ));
            }
            if let Some(args) = &spec.args {
                alternative.push_str(&format!(
                    r"\s+(?P<{}>{})",
                    slot.args,
                    self.alternation(args)?
                ));
            }
            alternative.push_str(r"\s*");

            alternatives.push(alternative);
            slots.push(slot);
        }

        let pattern = format!("^(?:{})$", alternatives.join("|"));
        tracing::debug!("GRAMMAR: {pattern}");

        for overlap in find_overlaps(self.registry, specs)? {
            tracing::warn!(
                "`{}` is accepted by both `{}` and `{}`; `{}` wins",
                overlap.literal,
                overlap.winner,
                overlap.shadowed,
                overlap.winner
            );
        }

        Ok(CompiledGrammar {
            regex: Regex::new(&pattern)?,
            slots,
        })
    }

    fn alternation(&self, name: &str) -> GrammarResult<String> {
        Ok(format!("(?:{})", self.registry.token_set(name)?.to_regex()))
    }
}

/// Literals shared between the command token sets of different specs.
pub fn find_overlaps(
    registry: &TokenRegistry,
    specs: &[CommandSpec],
) -> GrammarResult<Vec<Overlap>> {
    let mut owner: HashMap<&str, &str> = HashMap::new();
    let mut overlaps = Vec::new();

    for spec in specs {
        for literal in registry.token_set(&spec.command)?.spellings() {
            match owner.get(literal.as_str()) {
                Some(first) if *first != spec.command => overlaps.push(Overlap {
                    literal: literal.clone(),
                    winner: first.to_string(),
                    shadowed: spec.command.clone(),
                }),
                Some(_) => {}
                None => {
                    owner.insert(literal, &spec.command);
                }
            }
        }
    }

    Ok(overlaps)
}
