//! Command grammar for the operator shell.
//!
//! Commands are declared as `(command, subcommand, args)` triples over named
//! token sets, then compiled once into a single anchored regex. Matching a
//! line yields the canonical command plus the typed subcommand and argument
//! text, which Control routes on.
//!
//! ```
//! use munin::internal::grammar::{GrammarCompiler, TokenRegistry, default_command_specs};
//!
//! let registry = TokenRegistry::default();
//! let grammar = GrammarCompiler::new(&registry)
//!     .compile(&default_command_specs())
//!     .unwrap();
//!
//! let result = grammar.matches("pg add 2 3").unwrap();
//! assert_eq!(result.command, "plugins");
//! assert_eq!(result.args.as_deref(), Some("2 3"));
//! assert!(grammar.matches("plugins add").is_none());
//! ```

pub mod compiler;
pub mod error;
pub mod tokens;

pub use compiler::{
    CommandSpec, CompiledGrammar, GrammarCompiler, MatchResult, Overlap, default_command_specs,
    find_overlaps,
};
pub use error::{GrammarError, GrammarResult};
pub use tokens::{TokenRegistry, TokenSet};
