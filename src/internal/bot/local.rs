//! In-process bot driven by a message channel.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use futures::{FutureExt, future::BoxFuture};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use super::{Bot, ChatMessage};
use crate::internal::plugin::{PluginId, SharedPlugin};

/// A bot living in the current process.
///
/// Messages pushed into [`LocalBot::inbox`] are routed to the registered
/// plugins by the event loop; everything the bot says is kept in a
/// transcript.
pub struct LocalBot {
    nick: String,
    plugins: RwLock<Vec<SharedPlugin>>,
    sudoers: RwLock<BTreeSet<String>>,
    transcript: Mutex<Vec<String>>,
    inbox_tx: UnboundedSender<ChatMessage>,
    inbox_rx: Mutex<Option<UnboundedReceiver<ChatMessage>>>,
    shutdown: CancellationToken,
}

impl LocalBot {
    pub fn new(nick: impl Into<String>) -> Arc<Self> {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            nick: nick.into(),
            plugins: RwLock::new(Vec::new()),
            sudoers: RwLock::new(BTreeSet::new()),
            transcript: Mutex::new(Vec::new()),
            inbox_tx,
            inbox_rx: Mutex::new(Some(inbox_rx)),
            shutdown: CancellationToken::new(),
        })
    }

    /// Sender feeding the event loop.
    pub fn inbox(&self) -> UnboundedSender<ChatMessage> {
        self.inbox_tx.clone()
    }

    /// Everything the bot said so far.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Route one message to the registered plugins and say their replies.
    ///
    /// Plugins that only answer when addressed are skipped unless the message
    /// starts with `<nick>:`. Returns the replies, in plugin order.
    pub fn handle_message(&self, message: &ChatMessage) -> Vec<String> {
        let (explicit, content) = message.addressed_to(&self.nick);
        let sudo = self
            .sudoers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&message.author);

        let mut replies = Vec::new();
        for plugin in self.plugins() {
            if plugin.only_on_explicit_dest() && !explicit {
                continue;
            }
            let Some(captures) = plugin.regex().captures(content) else {
                continue;
            };
            let reply = plugin.do_command(self, &captures, sudo, &message.author);
            if !reply.is_empty() {
                self.send_message(&reply);
                replies.push(reply);
            }
        }
        replies
    }
}

impl Bot for LocalBot {
    fn nick(&self) -> &str {
        &self.nick
    }

    fn run(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move {
            let inbox = self
                .inbox_rx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            let Some(mut inbox) = inbox else {
                tracing::warn!(nick = %self.nick, "bot event loop already started");
                return;
            };

            tracing::info!(nick = %self.nick, "bot event loop started");
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    message = inbox.recv() => match message {
                        Some(message) => {
                            tracing::debug!(author = %message.author, content = %message.content, "message received");
                            self.handle_message(&message);
                        }
                        None => break,
                    },
                }
            }
            tracing::info!(nick = %self.nick, "bot event loop stopped");
        }
        .boxed()
    }

    fn disconnect(&self) {
        self.shutdown.cancel();
        tracing::info!(nick = %self.nick, "disconnected");
    }

    fn is_connected(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    fn send_message(&self, text: &str) {
        if !self.is_connected() {
            tracing::warn!(nick = %self.nick, "not connected, dropping message");
            return;
        }
        tracing::info!("<{}> {}", self.nick, text);
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
    }

    fn add_plugin(&self, plugin: SharedPlugin) {
        let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
        if plugins.iter().any(|p| p.id() == plugin.id()) {
            return;
        }
        tracing::debug!(plugin = %plugin.label(), "plugin registered");
        plugins.push(plugin);
    }

    fn has_plugin(&self, id: PluginId) -> bool {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|p| p.id() == id)
    }

    fn del_plugin(&self, id: PluginId) -> bool {
        let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
        let before = plugins.len();
        plugins.retain(|p| p.id() != id);
        before != plugins.len()
    }

    fn plugins(&self) -> Vec<SharedPlugin> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn add_sudoer(&self, nick: &str) {
        self.sudoers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(nick.to_string());
    }

    fn rmv_sudoer(&self, nick: &str) -> bool {
        self.sudoers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(nick)
    }

    fn sudoers(&self) -> BTreeSet<String> {
        self.sudoers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
