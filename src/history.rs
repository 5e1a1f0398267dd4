//! Label history: an audit trail of symbol additions, renames and removals.
//!
//! Entries are keyed by address and by the [`ProxyKey`] of the symbol they
//! describe. Memory moves relocate entries; promoting a dynamic symbol rekeys
//! whatever was attached to its address-derived identity.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::symbol::{ProxyKey, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryAction {
    Added,
    Renamed,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub address: Address,
    pub symbol: ProxyKey,
    pub action: HistoryAction,
    /// The name, or `"old to new"` for renames.
    pub label: String,
    /// Seconds since UNIX epoch.
    pub timestamp: u64,
}

pub trait LabelHistory: Send + Sync {
    fn record(&self, address: Address, symbol: ProxyKey, action: HistoryAction, label: &str);

    /// Relocate every entry at `from` to `to`.
    fn move_address(&self, from: Address, to: Address);

    /// Reattach entries recorded against `from` to the persisted symbol `to`.
    fn rekey(&self, from: ProxyKey, to: SymbolId);

    fn history_at(&self, address: Address) -> Vec<HistoryEntry>;
}

/// Append-only in-memory history.
#[derive(Debug, Default)]
pub struct MemLabelHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemLabelHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_of(&self, symbol: ProxyKey) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.symbol == symbol)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LabelHistory for MemLabelHistory {
    fn record(&self, address: Address, symbol: ProxyKey, action: HistoryAction, label: &str) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.entries.lock().push(HistoryEntry {
            address,
            symbol,
            action,
            label: label.to_string(),
            timestamp,
        });
    }

    fn move_address(&self, from: Address, to: Address) {
        for entry in self.entries.lock().iter_mut() {
            if entry.address == from {
                entry.address = to;
            }
            if entry.symbol == ProxyKey::Dynamic(from) {
                entry.symbol = ProxyKey::Dynamic(to);
            }
        }
    }

    fn rekey(&self, from: ProxyKey, to: SymbolId) {
        for entry in self.entries.lock().iter_mut() {
            if entry.symbol == from {
                entry.symbol = ProxyKey::Persisted(to);
            }
        }
    }

    fn history_at(&self, address: Address) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.address == address)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_relocates_entries() {
        let history = MemLabelHistory::new();
        let id = SymbolId::new(1).unwrap();
        history.record(Address::ram(0x10), ProxyKey::Persisted(id), HistoryAction::Added, "a");
        history.move_address(Address::ram(0x10), Address::ram(0x90));
        assert!(history.history_at(Address::ram(0x10)).is_empty());
        assert_eq!(history.history_at(Address::ram(0x90)).len(), 1);
    }

    #[test]
    fn rekey_moves_dynamic_entries_to_persisted_id() {
        let history = MemLabelHistory::new();
        let addr = Address::ram(0x10);
        let id = SymbolId::new(3).unwrap();
        history.record(addr, ProxyKey::Dynamic(addr), HistoryAction::Added, "LAB_00000010");
        history.rekey(ProxyKey::Dynamic(addr), id);
        assert!(history.history_of(ProxyKey::Dynamic(addr)).is_empty());
        assert_eq!(history.history_of(ProxyKey::Persisted(id)).len(), 1);
    }
}
