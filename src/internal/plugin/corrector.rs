//! Corrector plugin: rewrite your last line with `s/pattern/replacement/`.
//!
//! ```text
//! lucas| hellp
//! lucas| s/p/o
//! munin| hello      «««« corrected lucas words
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::{Plugin, PluginId, lock};
use crate::internal::bot::Bot;

pub const KIND: &str = "corrector";

lazy_static! {
    static ref REGEX: Regex = Regex::new(r"^(.*)$").expect("Invalid Regex");
    static ref SUBSTITUTION: Regex = Regex::new(r"^s/([^/]+)/([^/]+)/?.*$").expect("Invalid Regex");
}

/// Remembers the last line of every author.
pub struct Corrector {
    id: PluginId,
    last_words: Mutex<HashMap<String, String>>,
}

impl Corrector {
    pub fn new(id: PluginId) -> Self {
        Self {
            id,
            last_words: Mutex::new(HashMap::new()),
        }
    }

    /// The last uncorrected line of `author`, if any.
    pub fn last_words(&self, author: &str) -> Option<String> {
        lock(&self.last_words).get(author).cloned()
    }
}

impl Plugin for Corrector {
    fn id(&self) -> PluginId {
        self.id
    }

    fn name(&self) -> &str {
        KIND
    }

    fn kind(&self) -> &'static str {
        KIND
    }

    fn regex(&self) -> &Regex {
        &REGEX
    }

    fn do_command(
        &self,
        _bot: &dyn Bot,
        captures: &Captures<'_>,
        _sudo: bool,
        author: &str,
    ) -> String {
        let text = captures.get(1).map_or("", |m| m.as_str());
        let mut last_words = lock(&self.last_words);

        let Some(substitution) = SUBSTITUTION.captures(text) else {
            last_words.insert(author.to_string(), text.to_string());
            return String::new();
        };
        let Some(last) = last_words.get_mut(author) else {
            return String::new();
        };

        let pattern = &substitution[1];
        let replacement = &substitution[2];
        match Regex::new(pattern) {
            Ok(regex) => {
                *last = regex.replace_all(last.as_str(), replacement).into_owned();
                format!("{last} \t«««« corrected {author} words")
            }
            Err(e) => {
                tracing::debug!(%author, error = %e, "ignoring invalid correction pattern");
                String::new()
            }
        }
    }

    fn only_on_explicit_dest(&self) -> bool {
        false
    }

    fn help(&self) -> &str {
        "CORRECTOR: apply regex as s/// format to your last sentence. Useless but fun."
    }

    fn debug_data(&self) -> String {
        format!("{:?}", lock(&self.last_words))
    }
}
