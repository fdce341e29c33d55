//! Internal layer: the bot and its plugins, the command grammar, the operator shell and its configuration.

pub mod bot;
pub mod config;
pub mod control;
pub mod grammar;
pub mod plugin;
