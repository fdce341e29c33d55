//! Gold ledger plugin: who owes whom a gold coin.
//!
//! Balances are queried from the channel with `gold [nick]`; every mutation
//! goes through the [`GoldLedger`] capability, which the shell's `operate`
//! menu drives.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Mutex;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Plugin, PluginId, PluginResult, PluginStore, lock};
use crate::internal::bot::Bot;

pub const KIND: &str = "gold";

/// Blob key of the ledger.
pub const LEDGER_KEY: &str = "gold_ledger";

/// Graph node standing for freshly created gold.
const MINT: &str = "(mint)";

lazy_static! {
    static ref REGEX: Regex =
        Regex::new(r"^\s*golds?(?:\s+([a-zA-Z0-9_-]+))?\s*$").expect("Invalid Regex");
}

#[derive(Debug, Error)]
pub enum GoldError {
    #[error("{0} has no gold to give")]
    Insufficient(String),

    #[error("a name is required")]
    EmptyName,

    #[error("{0} cannot hold more gold")]
    Overflow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GoldResult<T> = Result<T, GoldError>;

/// Operations the shell may run against a gold ledger.
pub trait GoldLedger: Send + Sync {
    /// Give one gold to `receiver`, taken from `donator` if any, created otherwise.
    fn give_gold(&self, receiver: &str, donator: Option<&str>) -> GoldResult<()>;

    /// Create `amount` gold for `receiver`.
    fn create_gold_for(&self, receiver: &str, amount: u32) -> GoldResult<()>;

    /// Forget every name holding no gold. Returns how many were dropped.
    fn clean_unused_names(&self) -> usize;

    /// Write the transfer graph to `path`, in Graphviz DOT.
    fn save_graph(&self, path: &Path) -> GoldResult<()>;

    fn balance(&self, name: &str) -> u32;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Transfer {
    /// `None` for created gold.
    from: Option<String>,
    to: String,
    amount: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Ledger {
    balances: BTreeMap<String, u32>,
    transfers: Vec<Transfer>,
}

impl Ledger {
    fn balance(&self, name: &str) -> u32 {
        self.balances.get(name).copied().unwrap_or(0)
    }

    /// Move `amount` gold to `to`, taken from `from` if any, created otherwise.
    ///
    /// Every check runs before the first mutation: on error the ledger is
    /// left as it was.
    fn transfer(&mut self, from: Option<&str>, to: &str, amount: u32) -> GoldResult<()> {
        let overflow = || GoldError::Overflow(to.to_string());

        let mut credited = self.balance(to);
        let debited = match from {
            Some(from) => {
                let held = self.balance(from);
                if held < amount {
                    return Err(GoldError::Insufficient(from.to_string()));
                }
                if from == to {
                    credited -= amount;
                }
                Some((from, held - amount))
            }
            None => None,
        };
        let credited = credited.checked_add(amount).ok_or_else(overflow)?;

        let edge = self
            .transfers
            .iter()
            .position(|t| t.from.as_deref() == from && t.to == to);
        let edge_amount = match edge {
            Some(idx) => Some(
                self.transfers[idx]
                    .amount
                    .checked_add(amount)
                    .ok_or_else(overflow)?,
            ),
            None => None,
        };

        if let Some((from, held)) = debited {
            self.balances.insert(from.to_string(), held);
        }
        self.balances.insert(to.to_string(), credited);
        match (edge, edge_amount) {
            (Some(idx), Some(total)) => self.transfers[idx].amount = total,
            _ => self.transfers.push(Transfer {
                from: from.map(str::to_string),
                to: to.to_string(),
                amount,
            }),
        }
        Ok(())
    }
}

pub struct GoldManager {
    id: PluginId,
    ledger: Mutex<Ledger>,
    store: PluginStore,
}

impl GoldManager {
    pub fn new(id: PluginId, store: PluginStore) -> Self {
        Self {
            id,
            ledger: Mutex::new(Ledger::default()),
            store,
        }
    }

    /// Every known name with its balance, sorted by name.
    pub fn balances(&self) -> Vec<(String, u32)> {
        lock(&self.ledger)
            .balances
            .iter()
            .map(|(name, gold)| (name.clone(), *gold))
            .collect()
    }
}

fn checked_name(name: &str) -> GoldResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GoldError::EmptyName);
    }
    Ok(name)
}

impl GoldLedger for GoldManager {
    fn give_gold(&self, receiver: &str, donator: Option<&str>) -> GoldResult<()> {
        let receiver = checked_name(receiver)?;
        let donator = donator.map(checked_name).transpose()?;
        lock(&self.ledger).transfer(donator, receiver, 1)?;
        tracing::debug!(%receiver, ?donator, "gold given");
        Ok(())
    }

    fn create_gold_for(&self, receiver: &str, amount: u32) -> GoldResult<()> {
        let receiver = checked_name(receiver)?;
        lock(&self.ledger).transfer(None, receiver, amount)
    }

    fn clean_unused_names(&self) -> usize {
        let mut ledger = lock(&self.ledger);
        let before = ledger.balances.len();
        ledger.balances.retain(|_, gold| *gold > 0);
        before - ledger.balances.len()
    }

    fn save_graph(&self, path: &Path) -> GoldResult<()> {
        let ledger = lock(&self.ledger);
        let mut dot = String::from("digraph gold {\n");
        for transfer in &ledger.transfers {
            let _ = writeln!(
                dot,
                "    \"{}\" -> \"{}\" [label=\"{}\"];",
                transfer.from.as_deref().unwrap_or(MINT),
                transfer.to,
                transfer.amount
            );
        }
        dot.push_str("}\n");
        std::fs::write(path, dot)?;
        tracing::info!(path = %path.display(), "gold graph written");
        Ok(())
    }

    fn balance(&self, name: &str) -> u32 {
        lock(&self.ledger).balance(name.trim())
    }
}

impl Plugin for GoldManager {
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
        let name = captures.get(1).map_or(author, |m| m.as_str());
        format!("{name} has {} gold", self.balance(name))
    }

    fn help(&self) -> &str {
        "GOLD: 'gold [nick]' tells how much gold someone holds."
    }

    fn load_persistent_data(&self) -> PluginResult<()> {
        if let Some(bytes) = self.store.read_blob(LEDGER_KEY)? {
            *lock(&self.ledger) = serde_json::from_slice(&bytes)?;
        }
        Ok(())
    }

    fn save_persistent_data(&self) -> PluginResult<()> {
        let bytes = serde_json::to_vec(&*lock(&self.ledger))?;
        self.store.write_blob(LEDGER_KEY, &bytes)?;
        Ok(())
    }

    fn debug_data(&self) -> String {
        let ledger = lock(&self.ledger);
        format!(
            "{} name(s), {} transfer edge(s)",
            ledger.balances.len(),
            ledger.transfers.len()
        )
    }

    fn as_gold_ledger(&self) -> Option<&dyn GoldLedger> {
        Some(self)
    }
}
