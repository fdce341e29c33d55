//! The bot the shell administers.
//!
//! The network side of a real bot is out of reach here: [`Bot`] is the
//! surface the shell and the plugins need, and [`LocalBot`] is an in-process
//! implementation whose event loop reads messages from a channel instead of a
//! socket. Implementations synchronize their own state: the event loop and
//! the shell call into the same bot concurrently.

pub mod local;
pub mod message;

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::internal::plugin::{PluginId, SharedPlugin};

pub use local::LocalBot;
pub use message::ChatMessage;

pub trait Bot: Send + Sync + 'static {
    fn nick(&self) -> &str;

    /// The bot's event loop. Resolves once the bot is disconnected.
    fn run(self: Arc<Self>) -> BoxFuture<'static, ()>;

    /// Stop the event loop and drop the connection.
    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    /// Say `text` on the channel.
    fn send_message(&self, text: &str);

    /// Put a plugin in the registry. No-op if its id is already there.
    fn add_plugin(&self, plugin: SharedPlugin);

    fn has_plugin(&self, id: PluginId) -> bool;

    /// Remove a plugin by id. Returns false if it was not registered.
    fn del_plugin(&self, id: PluginId) -> bool;

    /// Registered plugins, in registration order.
    fn plugins(&self) -> Vec<SharedPlugin>;

    fn add_sudoer(&self, nick: &str);

    /// Returns false if `nick` was not a sudoer.
    fn rmv_sudoer(&self, nick: &str) -> bool;

    fn sudoers(&self) -> BTreeSet<String>;
}
