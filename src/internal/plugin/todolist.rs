//! Todo-list plugin: `todo add|check|print|save|load|clean`, for sudoers only.

use std::sync::Mutex;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::{Plugin, PluginId, PluginResult, PluginStore, lock};
use crate::internal::bot::Bot;

pub const KIND: &str = "todolist";

/// Blob key used when no list name is given.
pub const DEFAULT_SAVEFILE: &str = "default_todo_list";

/// A feature reads the sub-command captures and may return a reply.
type Feature = fn(&mut TodoState, &Captures<'_>, &PluginStore) -> Option<String>;

lazy_static! {
    static ref REGEX: Regex = Regex::new(r"^ *to?do? (.+)$").expect("Invalid Regex");
    static ref FEATURES: Vec<(Regex, Feature)> = vec![
        (
            Regex::new(r"^a(?:dd)? +(.*)$").expect("Invalid Regex"),
            todolist_add as Feature,
        ),
        (
            Regex::new(r"^c(?:heck)?((?:\s+\d+)+)$").expect("Invalid Regex"),
            todolist_check as Feature,
        ),
        (Regex::new(r"^p(?:rint)? *$").expect("Invalid Regex"), todolist_print as Feature),
        (
            Regex::new(r"^s(?:ave)?(?: +([a-zA-Z0-9_]+))? *$").expect("Invalid Regex"),
            todolist_save as Feature,
        ),
        (
            Regex::new(r"^l(?:oad)?(?: +([a-zA-Z0-9_]+))? *$").expect("Invalid Regex"),
            todolist_load as Feature,
        ),
        (Regex::new(r"^(?:clean|clear) *$").expect("Invalid Regex"), todolist_clean as Feature),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    pub checked: bool,
}

#[derive(Debug, Default)]
struct TodoState {
    items: Vec<TodoItem>,
    savefile: String,
}

/// Shared todo list managed from the channel.
pub struct TodoList {
    id: PluginId,
    state: Mutex<TodoState>,
    store: PluginStore,
}

impl TodoList {
    pub fn new(id: PluginId, store: PluginStore) -> Self {
        Self {
            id,
            state: Mutex::new(TodoState {
                items: Vec::new(),
                savefile: DEFAULT_SAVEFILE.to_string(),
            }),
            store,
        }
    }

    /// Snapshot of the current items.
    pub fn items(&self) -> Vec<TodoItem> {
        lock(&self.state).items.clone()
    }
}

impl Plugin for TodoList {
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
        sudo: bool,
        _author: &str,
    ) -> String {
        if !sudo {
            return String::new();
        }
        let command = captures.get(1).map_or("", |m| m.as_str());

        let mut state = lock(&self.state);
        let mut results = String::new();
        for (regex, feature) in FEATURES.iter() {
            if let Some(caps) = regex.captures(command) {
                results.push_str(&feature(&mut *state, &caps, &self.store).unwrap_or_default());
            }
        }
        results
    }

    fn help(&self) -> &str {
        "TODOLIST: wait for 'todo {add,print,check,clean,load,save}' command, for management of todo lists. Need sudo."
    }

    fn load_persistent_data(&self) -> PluginResult<()> {
        let mut state = lock(&self.state);
        let savefile = state.savefile.clone();
        if let Some(items) = read_items(&self.store, &savefile)? {
            state.items = items;
        }
        Ok(())
    }

    fn save_persistent_data(&self) -> PluginResult<()> {
        let state = lock(&self.state);
        write_items(&self.store, &state.savefile, &state.items)
    }

    fn debug_data(&self) -> String {
        let state = lock(&self.state);
        format!(
            "{} item(s), {} checked, savefile {}",
            state.items.len(),
            state.items.iter().filter(|item| item.checked).count(),
            state.savefile
        )
    }
}

fn read_items(store: &PluginStore, key: &str) -> PluginResult<Option<Vec<TodoItem>>> {
    match store.read_blob(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn write_items(store: &PluginStore, key: &str, items: &[TodoItem]) -> PluginResult<()> {
    let bytes = serde_json::to_vec(items)?;
    store.write_blob(key, &bytes)?;
    Ok(())
}

fn todolist_add(state: &mut TodoState, caps: &Captures<'_>, _: &PluginStore) -> Option<String> {
    let text = caps.get(1).map_or("", |m| m.as_str());
    state.items.push(TodoItem {
        text: text.to_string(),
        checked: false,
    });
    None
}

fn todolist_check(state: &mut TodoState, caps: &Captures<'_>, _: &PluginStore) -> Option<String> {
    let indexes: Vec<usize> = caps
        .get(1)
        .map_or("", |m| m.as_str())
        .split_whitespace()
        .filter_map(|idx| idx.parse().ok())
        .collect();
    for (idx, item) in state.items.iter_mut().enumerate() {
        if indexes.contains(&idx) {
            item.checked = true;
        }
    }
    None
}

fn todolist_print(state: &mut TodoState, _: &Captures<'_>, _: &PluginStore) -> Option<String> {
    if state.items.is_empty() {
        return Some("no item in current todolist".to_string());
    }
    let lines: Vec<String> = state
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            format!(
                "\t{idx}: {}{}",
                item.text,
                if item.checked { " \t[CHECK]" } else { "" }
            )
        })
        .collect();
    Some(lines.join("\n"))
}

fn todolist_save(state: &mut TodoState, caps: &Captures<'_>, store: &PluginStore) -> Option<String> {
    let name = caps
        .get(1)
        .map_or(state.savefile.as_str(), |m| m.as_str())
        .to_string();
    match write_items(store, &name, &state.items) {
        Ok(()) => Some(format!("todolist saved as {name}")),
        Err(e) => {
            tracing::warn!(list = %name, error = %e, "failed to save todolist");
            Some("todolist not saved !".to_string())
        }
    }
}

fn todolist_load(state: &mut TodoState, caps: &Captures<'_>, store: &PluginStore) -> Option<String> {
    let name = caps
        .get(1)
        .map_or(state.savefile.as_str(), |m| m.as_str())
        .to_string();
    match read_items(store, &name) {
        Ok(Some(items)) => {
            state.items = items;
            Some(format!("todolist {name} loaded"))
        }
        Ok(None) => Some("todolist not loaded !".to_string()),
        Err(e) => {
            tracing::warn!(list = %name, error = %e, "failed to load todolist");
            Some("todolist not loaded !".to_string())
        }
    }
}

fn todolist_clean(state: &mut TodoState, _: &Captures<'_>, _: &PluginStore) -> Option<String> {
    state.items.retain(|item| !item.checked);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::bot::LocalBot;

    fn run(plugin: &TodoList, line: &str, sudo: bool) -> String {
        let bot = LocalBot::new("munin");
        let caps = plugin.regex().captures(line).unwrap();
        plugin.do_command(bot.as_ref(), &caps, sudo, "alice")
    }

    #[test]
    fn test_needs_sudo() {
        let tmp = tempfile::TempDir::new().unwrap();
        let plugin = TodoList::new(1, PluginStore::new(tmp.path()));
        assert_eq!(run(&plugin, "todo add milk", false), "");
        assert!(plugin.items().is_empty());
    }

    #[test]
    fn test_add_check_print_clean() {
        let tmp = tempfile::TempDir::new().unwrap();
        let plugin = TodoList::new(1, PluginStore::new(tmp.path()));

        assert_eq!(run(&plugin, "todo print", true), "no item in current todolist");
        run(&plugin, "todo add buy milk", true);
        run(&plugin, "td a fix bike", true);
        run(&plugin, "todo check 0", true);
        assert_eq!(
            run(&plugin, "todo p", true),
            "\t0: buy milk \t[CHECK]\n\t1: fix bike"
        );

        run(&plugin, "todo clean", true);
        assert_eq!(
            plugin.items(),
            vec![TodoItem {
                text: "fix bike".to_string(),
                checked: false
            }]
        );
    }

    #[test]
    fn test_named_save_and_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = PluginStore::new(tmp.path());
        let plugin = TodoList::new(1, store.clone());

        run(&plugin, "todo add groceries", true);
        assert_eq!(run(&plugin, "todo save week", true), "todolist saved as week");
        run(&plugin, "todo clear", true);
        run(&plugin, "todo add other", true);

        assert_eq!(run(&plugin, "todo load week", true), "todolist week loaded");
        assert_eq!(plugin.items()[0].text, "groceries");
        assert_eq!(run(&plugin, "todo load missing", true), "todolist not loaded !");
    }

    #[test]
    fn test_persistent_data_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = PluginStore::new(tmp.path());

        let plugin = TodoList::new(1, store.clone());
        run(&plugin, "todo add water plants", true);
        plugin.save_persistent_data().unwrap();

        let restored = TodoList::new(1, store);
        restored.load_persistent_data().unwrap();
        assert_eq!(restored.items(), plugin.items());
    }

    #[test]
    fn test_load_without_blob_keeps_empty_list() {
        let tmp = tempfile::TempDir::new().unwrap();
        let plugin = TodoList::new(1, PluginStore::new(tmp.path()));
        plugin.load_persistent_data().unwrap();
        assert!(plugin.items().is_empty());
    }

    #[test]
    fn test_regex_requires_todo_prefix() {
        let tmp = tempfile::TempDir::new().unwrap();
        let plugin = TodoList::new(1, PluginStore::new(tmp.path()));
        assert!(plugin.regex().captures("hello there").is_none());
        assert!(plugin.regex().captures("todo print").is_some());
    }
}
