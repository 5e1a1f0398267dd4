//! In-memory record store backed by DashMap.
//!
//! Provides the fastest possible lookups and is the default backend when no
//! data directory is configured. All data is lost on process exit.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::address::Address;
use crate::record::SymbolRecord;
use crate::store::{RecordStore, StoreResult};
use crate::symbol::{AtomicSymbolAllocator, Namespace, SymbolId};

/// Concurrent in-memory record store using a sharded hashmap.
#[derive(Debug)]
pub struct MemRecordStore {
    data: DashMap<SymbolId, SymbolRecord>,
    allocator: AtomicSymbolAllocator,
    modifications: AtomicU64,
}

impl MemRecordStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            allocator: AtomicSymbolAllocator::new(),
            modifications: AtomicU64::new(0),
        }
    }

    /// Create a store with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: DashMap::with_capacity(capacity),
            ..Self::new()
        }
    }

    fn bump(&self) {
        self.modifications.fetch_add(1, Ordering::AcqRel);
    }

    fn collect_sorted(&self, keep: impl Fn(&SymbolRecord) -> bool) -> Vec<SymbolRecord> {
        let mut out: Vec<SymbolRecord> = self
            .data
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by_key(|r| r.id);
        out
    }
}

impl Default for MemRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemRecordStore {
    fn get(&self, id: SymbolId) -> StoreResult<Option<SymbolRecord>> {
        Ok(self.data.get(&id).map(|r| r.value().clone()))
    }

    fn update(&self, record: &SymbolRecord) -> StoreResult<()> {
        self.data.insert(record.id, record.clone());
        self.bump();
        Ok(())
    }

    fn remove(&self, id: SymbolId) -> StoreResult<bool> {
        let existed = self.data.remove(&id).is_some();
        if existed {
            self.bump();
        }
        Ok(existed)
    }

    fn allocate_key(&self) -> StoreResult<SymbolId> {
        self.allocator.next_id()
    }

    fn records_at(&self, address: Address) -> StoreResult<Vec<SymbolRecord>> {
        Ok(self.collect_sorted(|r| r.address == address))
    }

    fn records_in(&self, parent: Namespace) -> StoreResult<Vec<SymbolRecord>> {
        Ok(self.collect_sorted(|r| r.parent == parent))
    }

    fn scan(&self) -> StoreResult<Vec<SymbolRecord>> {
        Ok(self.collect_sorted(|_| true))
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.data.len())
    }

    fn modification_count(&self) -> u64 {
        self.modifications.load(Ordering::Acquire)
    }
}
