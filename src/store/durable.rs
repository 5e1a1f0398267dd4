//! ACID-durable record store backed by redb.
//!
//! Rows are bincode-encoded under their id. Two multimap tables index rows by
//! address and by parent namespace, and are kept in step with the main table
//! inside the same write transaction. The id counter is persisted so ids are
//! never reused across restarts.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use redb::{
    Database, MultimapTableDefinition, ReadableTable,
    ReadableTableMetadata, TableDefinition, WriteTransaction,
};

use crate::address::Address;
use crate::error::StoreError;
use crate::record::SymbolRecord;
use crate::store::{RecordStore, StoreResult};
use crate::symbol::{Namespace, SymbolId};

/// Symbol rows: id → bincode-encoded [`SymbolRecord`].
const SYMBOLS: TableDefinition<u64, &[u8]> = TableDefinition::new("symbols");
/// Address index: (space id, offset) → symbol ids.
const BY_ADDRESS: MultimapTableDefinition<(u16, u64), u64> =
    MultimapTableDefinition::new("symbols_by_address");
/// Parent index: raw namespace id → symbol ids.
const BY_PARENT: MultimapTableDefinition<u64, u64> =
    MultimapTableDefinition::new("symbols_by_parent");
/// Store bookkeeping (next id).
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID_KEY: &str = "next_id";

fn redb_err<E: std::fmt::Display>(op: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Redb {
        message: format!("{op} failed: {e}"),
    }
}

fn address_key(address: Address) -> (u16, u64) {
    (address.space().id(), address.offset())
}

/// ACID-durable symbol store using redb.
///
/// All writes go through transactions. Reads use MVCC snapshots.
pub struct DurableRecordStore {
    db: Arc<Database>,
    modifications: AtomicU64,
}

impl DurableRecordStore {
    /// Open or create a durable store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join("symbols.redb");
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        // Create every table up front so read transactions never see a missing table.
        let txn = db.begin_write().map_err(redb_err("begin_write"))?;
        {
            txn.open_table(SYMBOLS).map_err(redb_err("open_table"))?;
            txn.open_table(META).map_err(redb_err("open_table"))?;
            txn.open_multimap_table(BY_ADDRESS)
                .map_err(redb_err("open_multimap_table"))?;
            txn.open_multimap_table(BY_PARENT)
                .map_err(redb_err("open_multimap_table"))?;
        }
        txn.commit().map_err(redb_err("commit"))?;

        Ok(Self {
            db: Arc::new(db),
            modifications: AtomicU64::new(0),
        })
    }

    fn commit(&self, txn: WriteTransaction) -> StoreResult<()> {
        txn.commit().map_err(redb_err("commit"))?;
        self.modifications.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn load_ids(&self, ids: Vec<u64>) -> StoreResult<Vec<SymbolRecord>> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let table = txn.open_table(SYMBOLS).map_err(redb_err("open_table"))?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(guard) = table.get(id).map_err(redb_err("get"))? {
                out.push(SymbolRecord::decode(guard.value())?);
            }
        }
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    /// Remove the index entries of `old` inside an open write transaction.
    fn unindex(txn: &WriteTransaction, old: &SymbolRecord) -> StoreResult<()> {
        let raw = old.id.get();
        let mut by_address = txn
            .open_multimap_table(BY_ADDRESS)
            .map_err(redb_err("open_multimap_table"))?;
        by_address
            .remove(address_key(old.address), raw)
            .map_err(redb_err("remove"))?;
        let mut by_parent = txn
            .open_multimap_table(BY_PARENT)
            .map_err(redb_err("open_multimap_table"))?;
        by_parent
            .remove(old.parent.raw_id(), raw)
            .map_err(redb_err("remove"))?;
        Ok(())
    }

    fn take_old(txn: &WriteTransaction, id: SymbolId) -> StoreResult<Option<SymbolRecord>> {
        let table = txn.open_table(SYMBOLS).map_err(redb_err("open_table"))?;
        let bytes = table
            .get(id.get())
            .map_err(redb_err("get"))?
            .map(|guard| guard.value().to_vec());
        bytes.map(|b| SymbolRecord::decode(&b)).transpose()
    }
}

impl RecordStore for DurableRecordStore {
    fn get(&self, id: SymbolId) -> StoreResult<Option<SymbolRecord>> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let table = txn.open_table(SYMBOLS).map_err(redb_err("open_table"))?;
        let result = table.get(id.get()).map_err(redb_err("get"))?;
        result.map(|guard| SymbolRecord::decode(guard.value())).transpose()
    }

    fn update(&self, record: &SymbolRecord) -> StoreResult<()> {
        let encoded = record.encode()?;
        let raw = record.id.get();
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        if let Some(old) = Self::take_old(&txn, record.id)? {
            Self::unindex(&txn, &old)?;
        }
        {
            let mut table = txn.open_table(SYMBOLS).map_err(redb_err("open_table"))?;
            table
                .insert(raw, encoded.as_slice())
                .map_err(redb_err("insert"))?;
            let mut by_address = txn
                .open_multimap_table(BY_ADDRESS)
                .map_err(redb_err("open_multimap_table"))?;
            by_address
                .insert(address_key(record.address), raw)
                .map_err(redb_err("insert"))?;
            let mut by_parent = txn
                .open_multimap_table(BY_PARENT)
                .map_err(redb_err("open_multimap_table"))?;
            by_parent
                .insert(record.parent.raw_id(), raw)
                .map_err(redb_err("insert"))?;
        }
        self.commit(txn)
    }

    fn remove(&self, id: SymbolId) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        let Some(old) = Self::take_old(&txn, id)? else {
            txn.abort().map_err(redb_err("abort"))?;
            return Ok(false);
        };
        Self::unindex(&txn, &old)?;
        {
            let mut table = txn.open_table(SYMBOLS).map_err(redb_err("open_table"))?;
            table.remove(id.get()).map_err(redb_err("remove"))?;
        }
        self.commit(txn)?;
        Ok(true)
    }

    fn allocate_key(&self) -> StoreResult<SymbolId> {
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        let id = {
            let mut meta = txn.open_table(META).map_err(redb_err("open_table"))?;
            let next = meta
                .get(NEXT_ID_KEY)
                .map_err(redb_err("get"))?
                .map_or(1, |guard| guard.value());
            let id = SymbolId::new(next).ok_or(StoreError::KeysExhausted)?;
            let following = next.checked_add(1).ok_or(StoreError::KeysExhausted)?;
            meta.insert(NEXT_ID_KEY, following)
                .map_err(redb_err("insert"))?;
            id
        };
        // Key allocation does not change any row, so it does not bump the counter.
        txn.commit().map_err(redb_err("commit"))?;
        Ok(id)
    }

    fn records_at(&self, address: Address) -> StoreResult<Vec<SymbolRecord>> {
        let ids = {
            let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
            let index = txn
                .open_multimap_table(BY_ADDRESS)
                .map_err(redb_err("open_multimap_table"))?;
            let mut ids = Vec::new();
            for entry in index.get(address_key(address)).map_err(redb_err("get"))? {
                ids.push(entry.map_err(redb_err("iterate"))?.value());
            }
            ids
        };
        let mut records = self.load_ids(ids)?;
        records.retain(|r| r.address == address);
        Ok(records)
    }

    fn records_in(&self, parent: Namespace) -> StoreResult<Vec<SymbolRecord>> {
        let ids = {
            let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
            let index = txn
                .open_multimap_table(BY_PARENT)
                .map_err(redb_err("open_multimap_table"))?;
            let mut ids = Vec::new();
            for entry in index.get(parent.raw_id()).map_err(redb_err("get"))? {
                ids.push(entry.map_err(redb_err("iterate"))?.value());
            }
            ids
        };
        self.load_ids(ids)
    }

    fn scan(&self) -> StoreResult<Vec<SymbolRecord>> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let table = txn.open_table(SYMBOLS).map_err(redb_err("open_table"))?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(redb_err("iter"))? {
            let (_key, value) = entry.map_err(redb_err("iterate"))?;
            out.push(SymbolRecord::decode(value.value())?);
        }
        Ok(out)
    }

    fn len(&self) -> StoreResult<usize> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let table = txn.open_table(SYMBOLS).map_err(redb_err("open_table"))?;
        let n = table.len().map_err(redb_err("len"))?;
        Ok(n as usize)
    }

    fn modification_count(&self) -> u64 {
        self.modifications.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for DurableRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableRecordStore")
            .field("modifications", &self.modification_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{SourceType, SymbolType};
    use tempfile::TempDir;

    fn label(store: &DurableRecordStore, offset: u64, name: &str) -> SymbolRecord {
        let id = store.allocate_key().unwrap();
        let rec = SymbolRecord::new(
            id,
            SymbolType::Label,
            Address::ram(offset),
            name,
            Namespace::Global,
            SourceType::UserDefined,
        );
        store.update(&rec).unwrap();
        rec
    }

    #[test]
    fn update_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = DurableRecordStore::open(dir.path()).unwrap();

        let rec = label(&store, 0x1000, "entry");
        assert_eq!(store.get(rec.id).unwrap(), Some(rec.clone()));
        assert_eq!(store.len().unwrap(), 1);

        assert!(store.remove(rec.id).unwrap());
        assert!(!store.remove(rec.id).unwrap());
        assert_eq!(store.get(rec.id).unwrap(), None);
    }

    #[test]
    fn indexes_follow_moves_and_reparenting() {
        let dir = TempDir::new().unwrap();
        let store = DurableRecordStore::open(dir.path()).unwrap();

        let mut rec = label(&store, 0x1000, "entry");
        assert_eq!(store.records_at(Address::ram(0x1000)).unwrap().len(), 1);

        let ns = SymbolId::new(99).unwrap();
        rec.address = Address::ram(0x2000);
        rec.parent = Namespace::Symbol(ns);
        store.update(&rec).unwrap();

        assert!(store.records_at(Address::ram(0x1000)).unwrap().is_empty());
        assert_eq!(store.records_at(Address::ram(0x2000)).unwrap(), vec![rec.clone()]);
        assert!(store.records_in(Namespace::Global).unwrap().is_empty());
        assert_eq!(store.records_in(Namespace::Symbol(ns)).unwrap(), vec![rec]);
    }

    #[test]
    fn ids_and_rows_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let first = {
            let store = DurableRecordStore::open(dir.path()).unwrap();
            label(&store, 0x10, "a");
            label(&store, 0x20, "b")
        };

        let store = DurableRecordStore::open(dir.path()).unwrap();
        assert_eq!(store.get(first.id).unwrap(), Some(first.clone()));
        let next = store.allocate_key().unwrap();
        assert!(next > first.id);
    }

    #[test]
    fn commits_bump_modification_count() {
        let dir = TempDir::new().unwrap();
        let store = DurableRecordStore::open(dir.path()).unwrap();
        let before = store.modification_count();
        label(&store, 0x10, "a");
        assert_eq!(store.modification_count(), before + 1);
    }
}
