//! Object cache of live symbol proxies.
//!
//! The cache only saves reconstruction work: the record store stays the source
//! of truth. Entries are checked for staleness by their owners on access, never
//! proactively, and an entry whose identity changes (dynamic symbol promoted to
//! a persisted one) is remapped rather than rebuilt so every holder of the
//! proxy keeps seeing the same object.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::SymbolResult;
use crate::proxy::Symbol;
use crate::symbol::ProxyKey;

/// Concurrent map from [`ProxyKey`] to the one live proxy for that key.
#[derive(Debug, Default)]
pub struct ObjectCache {
    live: DashMap<ProxyKey, Arc<Symbol>>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            live: DashMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: ProxyKey) -> Option<Arc<Symbol>> {
        self.live.get(&key).map(|s| Arc::clone(s.value()))
    }

    /// Return the cached proxy for `key`, or build one with `loader` and cache it.
    ///
    /// A loader returning `Ok(None)` means "nothing exists under this key" and
    /// caches nothing.
    pub fn get_or_construct<F>(&self, key: ProxyKey, loader: F) -> SymbolResult<Option<Arc<Symbol>>>
    where
        F: FnOnce() -> SymbolResult<Option<Arc<Symbol>>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(Some(hit));
        }
        let Some(built) = loader()? else {
            return Ok(None);
        };
        let entry = self.live.entry(key).or_insert(built);
        Ok(Some(Arc::clone(entry.value())))
    }

    pub fn insert(&self, key: ProxyKey, symbol: Arc<Symbol>) {
        self.live.insert(key, symbol);
    }

    pub fn remove(&self, key: ProxyKey) -> Option<Arc<Symbol>> {
        self.live.remove(&key).map(|(_, s)| s)
    }

    /// Drop the entry for `key` only if it is still `symbol`.
    pub fn evict(&self, key: ProxyKey, symbol: &Symbol) {
        self.live
            .remove_if(&key, |_, cached| std::ptr::eq(cached.as_ref(), symbol));
    }

    /// Move the proxy cached under `old` to `new`.
    pub fn remap(&self, old: ProxyKey, new: ProxyKey) {
        if let Some((_, symbol)) = self.live.remove(&old) {
            self.live.insert(new, symbol);
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
