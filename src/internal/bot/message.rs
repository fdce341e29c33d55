//! Chat messages as the bot's router sees them.

/// One line said on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
        }
    }

    /// Split off a leading `nick:` or `nick,` address.
    ///
    /// Returns whether the message was addressed to `nick`, and the content
    /// without the address.
    pub fn addressed_to(&self, nick: &str) -> (bool, &str) {
        if let Some(rest) = self.content.strip_prefix(nick)
            && let Some(rest) = rest.strip_prefix([':', ','])
        {
            return (true, rest.trim_start());
        }
        (false, &self.content)
    }
}
