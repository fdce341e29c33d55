//! Chat plugins and the contract the bot and the shell rely on.
//!
//! A plugin owns one regex the bot's message router tests incoming messages
//! against, and a handler that receives the captures. Whether a plugin is
//! active is never stored on the plugin: it is active iff the bot's registry
//! holds it.
//!
//! Plugins are shared between the bot's event loop and the shell, so every
//! method takes `&self` and session state lives behind the plugin's own lock.

pub mod corrector;
pub mod gold;
pub mod store;
pub mod todolist;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use regex::{Captures, Regex};
use thiserror::Error;

use crate::internal::bot::Bot;

pub use corrector::Corrector;
pub use gold::{GoldError, GoldLedger, GoldManager};
pub use store::{PluginStore, StoreError};
pub use todolist::TodoList;

/// Identifier the operator uses to (de)activate a plugin.
pub type PluginId = u32;

/// A plugin shared between the bot and the shell.
pub type SharedPlugin = Arc<dyn Plugin>;

/// Errors raised while persisting plugin state.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Corrupt plugin data: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type PluginResult<T> = Result<T, PluginError>;

/// Interface every chat plugin implements.
pub trait Plugin: Send + Sync {
    fn id(&self) -> PluginId;

    fn name(&self) -> &str;

    /// Implementation kind, as named in the configuration.
    fn kind(&self) -> &'static str;

    /// Regex the message router tests against incoming message content.
    fn regex(&self) -> &Regex;

    /// Handle a message whose content matched [`Plugin::regex`].
    ///
    /// Returns the text to send back to the channel; empty means silence.
    fn do_command(&self, bot: &dyn Bot, captures: &Captures<'_>, sudo: bool, author: &str)
    -> String;

    /// Whether the plugin only sees messages addressed to the bot.
    fn only_on_explicit_dest(&self) -> bool {
        true
    }

    fn help(&self) -> &str;

    fn load_persistent_data(&self) -> PluginResult<()> {
        Ok(())
    }

    fn save_persistent_data(&self) -> PluginResult<()> {
        Ok(())
    }

    /// Free-form internal state, for the shell's `debug` command.
    fn debug_data(&self) -> String {
        String::new()
    }

    /// Display string used in listings.
    fn label(&self) -> String {
        format!("{}: {}", self.id(), self.name())
    }

    /// Gold-ledger capability, for plugins that keep one.
    fn as_gold_ledger(&self) -> Option<&dyn GoldLedger> {
        None
    }
}

/// Build the plugins of the given kinds, numbering them from 1 in order.
///
/// Unknown kinds are skipped with a warning.
pub fn import_plugins(kinds: &[String], store: &PluginStore) -> Vec<SharedPlugin> {
    let mut plugins: Vec<SharedPlugin> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let id = plugins.len() as PluginId + 1;
        let plugin: SharedPlugin = match kind.as_str() {
            todolist::KIND => Arc::new(TodoList::new(id, store.clone())),
            corrector::KIND => Arc::new(Corrector::new(id)),
            gold::KIND => Arc::new(GoldManager::new(id, store.clone())),
            other => {
                tracing::warn!(kind = other, "unknown plugin kind, skipping");
                continue;
            }
        };
        plugins.push(plugin);
    }
    plugins
}

/// Lock a plugin's session state. A panic in another handler does not make
/// the state unusable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
