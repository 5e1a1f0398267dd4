//! Record storage for symbol rows.
//!
//! Two backends implement [`RecordStore`]:
//!
//! - [`MemRecordStore`](mem::MemRecordStore) — rows in a concurrent hashmap (DashMap)
//! - [`DurableRecordStore`](durable::DurableRecordStore) — ACID transactions (redb)
//!   with secondary indexes by address and by parent namespace
//!
//! The store is the single source of truth. Every successful write bumps
//! [`RecordStore::modification_count`], which is how cached proxies notice that
//! their view may be stale.

pub mod durable;
pub mod mem;

use crate::address::Address;
use crate::error::StoreError;
use crate::record::SymbolRecord;
use crate::symbol::{Namespace, SymbolId};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistent key → record storage.
pub trait RecordStore: Send + Sync {
    /// Fetch a record. Absence is `Ok(None)`.
    fn get(&self, id: SymbolId) -> StoreResult<Option<SymbolRecord>>;

    /// Insert or replace the record stored under `record.id`.
    fn update(&self, record: &SymbolRecord) -> StoreResult<()>;

    /// Delete a record. Returns whether it existed.
    fn remove(&self, id: SymbolId) -> StoreResult<bool>;

    /// Reserve a fresh id. Ids are never reused, even after removal.
    fn allocate_key(&self) -> StoreResult<SymbolId>;

    /// All records located at `address`, ordered by id.
    fn records_at(&self, address: Address) -> StoreResult<Vec<SymbolRecord>>;

    /// All records whose parent is `parent`, ordered by id.
    fn records_in(&self, parent: Namespace) -> StoreResult<Vec<SymbolRecord>>;

    /// Every stored record, ordered by id.
    fn scan(&self) -> StoreResult<Vec<SymbolRecord>>;

    /// Number of stored records.
    fn len(&self) -> StoreResult<usize>;

    /// Whether the store holds no records.
    fn is_empty(&self) -> StoreResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Counter bumped by every successful mutation.
    fn modification_count(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::mem::MemRecordStore;
    use super::*;
    use crate::symbol::{SourceType, SymbolType};

    #[test]
    fn default_is_empty_uses_len() {
        let store = MemRecordStore::new();
        assert!(store.is_empty().unwrap());
        let id = store.allocate_key().unwrap();
        store
            .update(&SymbolRecord::new(
                id,
                SymbolType::Label,
                Address::ram(0x10),
                "start",
                Namespace::Global,
                SourceType::UserDefined,
            ))
            .unwrap();
        assert!(!store.is_empty().unwrap());
    }
}
