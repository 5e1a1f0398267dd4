//! Symbol registry: the owner of every live symbol proxy.
//!
//! The [`SymbolRegistry`] ties the record store to the object cache and to the
//! external collaborators (references, program context, label history, change
//! notification). It owns the registry-wide reentrant lock that every proxy
//! operation takes, and it enforces the invariants no single proxy can check
//! on its own: name uniqueness per scope, namespace eligibility and acyclicity,
//! and primary-symbol bookkeeping.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::address::Address;
use crate::cache::ObjectCache;
use crate::config::RegistryConfig;
use crate::context::{MemProgramContext, ProgramContext};
use crate::error::{SymbolError, SymbolResult, SymdbResult};
use crate::event::{ChangeEvent, ChangeNotifier, SymbolChange, TracingNotifier};
use crate::history::{HistoryAction, LabelHistory, MemLabelHistory};
use crate::name::{self, NAMESPACE_DELIMITER};
use crate::proxy::Symbol;
use crate::record::SymbolRecord;
use crate::reference::{MemReferenceIndex, RefOwner, ReferenceIndex};
use crate::rules::{StandardTypeRules, TypeRules};
use crate::store::RecordStore;
use crate::store::durable::DurableRecordStore;
use crate::store::mem::MemRecordStore;
use crate::symbol::{Namespace, ProxyKey, SourceType, SymbolId, SymbolType};

/// Everything needed to create a persisted symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSpec {
    pub name: String,
    pub symbol_type: SymbolType,
    /// Ignored for types that are not bound to an address.
    pub address: Address,
    pub namespace: Namespace,
    pub source: SourceType,
    pub data1: i64,
    /// Ordinal for parameters.
    pub data2: i32,
    pub data3: Option<String>,
}

impl SymbolSpec {
    /// A user-defined symbol in the global namespace.
    pub fn new(name: impl Into<String>, symbol_type: SymbolType, address: Address) -> Self {
        Self {
            name: name.into(),
            symbol_type,
            address,
            namespace: Namespace::Global,
            source: SourceType::UserDefined,
            data1: 0,
            data2: 0,
            data3: None,
        }
    }

    pub fn label(name: impl Into<String>, address: Address) -> Self {
        Self::new(name, SymbolType::Label, address)
    }

    pub fn function(name: impl Into<String>, address: Address) -> Self {
        Self::new(name, SymbolType::Function, address)
    }

    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new(name, SymbolType::Namespace, Address::NO_ADDRESS)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, SymbolType::Class, Address::NO_ADDRESS)
    }

    pub fn library(name: impl Into<String>) -> Self {
        Self::new(name, SymbolType::Library, Address::NO_ADDRESS)
    }

    pub fn in_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_source(mut self, source: SourceType) -> Self {
        self.source = source;
        self
    }

    pub fn with_data1(mut self, value: i64) -> Self {
        self.data1 = value;
        self
    }

    pub fn with_data2(mut self, value: i32) -> Self {
        self.data2 = value;
        self
    }

    pub fn with_data3(mut self, value: impl Into<String>) -> Self {
        self.data3 = Some(value.into());
        self
    }
}

/// Summary information about a registry.
#[derive(Debug, Clone)]
pub struct RegistryInfo {
    pub symbols: usize,
    pub cached: usize,
    pub modification_count: u64,
    pub persistent: bool,
}

impl std::fmt::Display for RegistryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "symbols: {}", self.symbols)?;
        writeln!(f, "cached proxies: {}", self.cached)?;
        writeln!(f, "modifications: {}", self.modification_count)?;
        write!(
            f,
            "storage: {}",
            if self.persistent { "durable" } else { "memory-only" }
        )
    }
}

/// Builder for a [`SymbolRegistry`] with injectable collaborators.
///
/// Every collaborator not supplied falls back to its in-memory implementation.
#[derive(Default)]
pub struct RegistryBuilder {
    config: RegistryConfig,
    store: Option<Arc<dyn RecordStore>>,
    references: Option<Arc<dyn ReferenceIndex>>,
    context: Option<Arc<dyn ProgramContext>>,
    history: Option<Arc<dyn LabelHistory>>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    rules: Option<Arc<dyn TypeRules>>,
}

impl RegistryBuilder {
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn references(mut self, references: Arc<dyn ReferenceIndex>) -> Self {
        self.references = Some(references);
        self
    }

    pub fn context(mut self, context: Arc<dyn ProgramContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn history(mut self, history: Arc<dyn LabelHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn rules(mut self, rules: Arc<dyn TypeRules>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn build(self) -> Arc<SymbolRegistry> {
        let cache = ObjectCache::with_capacity(self.config.cache_capacity);
        Arc::new_cyclic(|me| SymbolRegistry {
            me: me.clone(),
            lock: ReentrantMutex::new(()),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemRecordStore::new())),
            cache,
            members: DashMap::new(),
            references: self
                .references
                .unwrap_or_else(|| Arc::new(MemReferenceIndex::new())),
            context: self
                .context
                .unwrap_or_else(|| Arc::new(MemProgramContext::new())),
            history: self
                .history
                .unwrap_or_else(|| Arc::new(MemLabelHistory::new())),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            rules: self.rules.unwrap_or_else(|| Arc::new(StandardTypeRules)),
            config: self.config,
        })
    }
}

/// Registry of symbols over a record store.
pub struct SymbolRegistry {
    me: Weak<SymbolRegistry>,
    lock: ReentrantMutex<()>,
    config: RegistryConfig,
    store: Arc<dyn RecordStore>,
    cache: ObjectCache,
    /// Namespace → member ids, tagged with the store modification count it was read at.
    members: DashMap<Namespace, (u64, Vec<SymbolId>)>,
    references: Arc<dyn ReferenceIndex>,
    context: Arc<dyn ProgramContext>,
    history: Arc<dyn LabelHistory>,
    notifier: Arc<dyn ChangeNotifier>,
    rules: Arc<dyn TypeRules>,
}

impl SymbolRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A memory-only registry with default collaborators.
    pub fn new() -> Arc<Self> {
        Self::builder().build()
    }

    /// Open a registry with storage chosen by `config.data_dir`.
    pub fn open(config: &RegistryConfig) -> SymdbResult<Arc<Self>> {
        config.validate()?;
        let store: Arc<dyn RecordStore> = match &config.data_dir {
            Some(dir) => Arc::new(DurableRecordStore::open(dir)?),
            None => Arc::new(MemRecordStore::with_capacity(config.cache_capacity)),
        };
        let symbols = store.len()?;
        let registry = Self::builder().config(config.clone()).store(store).build();
        tracing::info!(
            data_dir = ?config.data_dir,
            symbols,
            "symbol registry opened"
        );
        Ok(registry)
    }

    /// Acquire the registry-wide lock. Reentrant on the same thread.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn references(&self) -> &dyn ReferenceIndex {
        self.references.as_ref()
    }

    pub fn context(&self) -> &dyn ProgramContext {
        self.context.as_ref()
    }

    pub fn history(&self) -> &dyn LabelHistory {
        self.history.as_ref()
    }

    pub fn rules(&self) -> &dyn TypeRules {
        self.rules.as_ref()
    }

    pub(crate) fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    pub fn info(&self) -> SymbolResult<RegistryInfo> {
        let _guard = self.lock();
        Ok(RegistryInfo {
            symbols: self.store.len()?,
            cached: self.cache.len(),
            modification_count: self.store.modification_count(),
            persistent: self.config.data_dir.is_some(),
        })
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// The proxy for a persisted symbol, `None` if no record has this id.
    pub fn symbol(&self, id: SymbolId) -> SymbolResult<Option<Arc<Symbol>>> {
        let _guard = self.lock();
        let key = ProxyKey::Persisted(id);
        if let Some(cached) = self.cache.get(key) {
            match cached.check_valid(self) {
                Ok(()) => return Ok(Some(cached)),
                // Stale proxy was evicted; the record may exist again under a new type.
                Err(SymbolError::IllegalState { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        self.cache.get_or_construct(key, || {
            let seen = self.store.modification_count();
            let Some(record) = self.store.get(id)? else {
                return Ok(None);
            };
            Symbol::from_record(self.me.clone(), record, seen).map(|s| Some(Arc::new(s)))
        })
    }

    /// Symbols at `address`, primary first.
    ///
    /// An address with references but no persisted symbol yields its dynamic symbol.
    pub fn symbols_at(&self, address: Address) -> SymbolResult<Vec<Arc<Symbol>>> {
        let _guard = self.lock();
        let records = self.store.records_at(address)?;
        if records.is_empty() {
            if self.references.reference_count_to(address) == 0 {
                return Ok(Vec::new());
            }
            return Ok(self.dynamic_symbol(address)?.into_iter().collect());
        }
        let primary = self.context.primary_at(address);
        let mut symbols = Vec::with_capacity(records.len());
        for record in records {
            if let Some(symbol) = self.symbol(record.id)? {
                symbols.push(symbol);
            }
        }
        symbols.sort_by_key(|s| (s.id() != primary, s.id()));
        Ok(symbols)
    }

    /// Members of `namespace`, ordered by id.
    pub fn symbols_in(&self, namespace: Namespace) -> SymbolResult<Vec<Arc<Symbol>>> {
        let _guard = self.lock();
        let seen = self.store.modification_count();
        let cached = self
            .members
            .get(&namespace)
            .filter(|entry| entry.0 == seen)
            .map(|entry| entry.1.clone());
        let ids = match cached {
            Some(ids) => ids,
            None => {
                let ids: Vec<SymbolId> = self
                    .store
                    .records_in(namespace)?
                    .into_iter()
                    .map(|r| r.id)
                    .collect();
                self.members.insert(namespace, (seen, ids.clone()));
                ids
            }
        };
        let mut symbols = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(symbol) = self.symbol(id)? {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }

    /// Every persisted symbol, ordered by id.
    pub fn all_symbols(&self) -> SymbolResult<Vec<Arc<Symbol>>> {
        let _guard = self.lock();
        let mut symbols = Vec::new();
        for record in self.store.scan()? {
            if let Some(symbol) = self.symbol(record.id)? {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }

    /// The dynamic symbol of a memory address that has no persisted symbol.
    pub fn dynamic_symbol(&self, address: Address) -> SymbolResult<Option<Arc<Symbol>>> {
        let _guard = self.lock();
        if !address.is_memory() || !self.store.records_at(address)?.is_empty() {
            return Ok(None);
        }
        self.cache.get_or_construct(ProxyKey::Dynamic(address), || {
            Ok(Some(Arc::new(Symbol::dynamic(self.me.clone(), address))))
        })
    }

    /// The primary symbol at `address`, falling back to a referenced dynamic symbol.
    pub fn primary_symbol(&self, address: Address) -> SymbolResult<Option<Arc<Symbol>>> {
        let _guard = self.lock();
        if let Some(id) = self.context.primary_at(address) {
            if let Some(symbol) = self.symbol(id)? {
                return Ok(Some(symbol));
            }
        }
        if self.references.reference_count_to(address) > 0 {
            return self.dynamic_symbol(address);
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a persisted symbol. The first label or function at an address
    /// becomes its primary symbol.
    pub fn create_symbol(&self, spec: SymbolSpec) -> SymbolResult<Arc<Symbol>> {
        let _guard = self.lock();
        let ty = spec.symbol_type;
        let caps = self.rules.capabilities(ty);
        let address = if caps.located {
            spec.address
        } else {
            Address::NO_ADDRESS
        };

        let source = self
            .rules
            .adjust_source(ty, &spec.name, address, spec.source);
        self.validate_source(&spec.name, address, ty, source)?;
        self.check_parent(ty, spec.namespace)?;
        let name = if source == SourceType::Default {
            String::new()
        } else {
            name::validate_name(&spec.name, self.config.max_name_length)?;
            self.check_duplicate_name(address, &spec.name, spec.namespace, ty, None)?;
            spec.name
        };

        let id = self.store.allocate_key()?;
        let mut record = SymbolRecord::new(id, ty, address, name, spec.namespace, source);
        record.data1 = spec.data1;
        record.data2 = spec.data2;
        record.data3 = spec.data3;
        if let Err(err) = self.store.update(&record) {
            tracing::warn!(symbol = %id, error = %err, "symbol create failed");
            return Err(err.into());
        }

        // A dynamic symbol cannot coexist with a persisted one.
        if let Some(dynamic) = self.cache.remove(ProxyKey::Dynamic(address)) {
            dynamic.invalidate();
        }
        self.claim_primary(address, id, ty);

        let label = self.display_name(&record)?;
        let symbol = Arc::new(Symbol::from_record(
            self.me.clone(),
            record,
            self.store.modification_count(),
        )?);
        let key = ProxyKey::Persisted(id);
        self.cache.insert(key, Arc::clone(&symbol));
        self.history
            .record(address, key, HistoryAction::Added, &label);
        self.emit(key, address, SymbolChange::Added);
        tracing::debug!(symbol = %id, name = %label, %address, "symbol created");
        Ok(symbol)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check that `source` is acceptable for a symbol of type `ty` named `name`.
    pub fn validate_source(
        &self,
        name: &str,
        address: Address,
        ty: SymbolType,
        source: SourceType,
    ) -> SymbolResult<()> {
        let caps = self.rules.capabilities(ty);
        if source == SourceType::Default {
            if !caps.allows_default_source {
                return Err(SymbolError::invalid_input(format!(
                    "{ty} symbols cannot have a default name"
                )));
            }
            if caps.default_prefix.is_some() && !address.is_memory() {
                return Err(SymbolError::invalid_input(format!(
                    "a default-named {ty} needs a memory address, not {address}"
                )));
            }
        } else if name.is_empty() {
            return Err(SymbolError::invalid_input(format!(
                "a {source} {ty} symbol needs a name"
            )));
        }
        Ok(())
    }

    /// Fail with `DuplicateName` if another non-default symbol of type `ty`
    /// already uses `name` at `address` in `namespace`.
    pub fn check_duplicate_name(
        &self,
        address: Address,
        name: &str,
        namespace: Namespace,
        ty: SymbolType,
        exclude: Option<SymbolId>,
    ) -> SymbolResult<()> {
        let clash = self.store.records_at(address)?.into_iter().any(|r| {
            r.parent == namespace
                && r.type_tag == ty.tag()
                && r.source() != SourceType::Default
                && r.name == name
                && Some(r.id) != exclude
        });
        if clash {
            return Err(SymbolError::DuplicateName {
                name: name.to_string(),
                namespace: self.namespace_display(namespace),
                address: address.to_string(),
            });
        }
        Ok(())
    }

    /// Whether `namespace` exists and may contain a symbol of type `ty`.
    pub fn is_valid_parent(&self, ty: SymbolType, namespace: Namespace) -> SymbolResult<bool> {
        match self.check_parent(ty, namespace) {
            Ok(()) => Ok(true),
            Err(SymbolError::InvalidInput { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn check_parent(&self, ty: SymbolType, namespace: Namespace) -> SymbolResult<()> {
        let Some(id) = namespace.symbol_id() else {
            if self.rules.is_valid_parent(ty, None) {
                return Ok(());
            }
            return Err(SymbolError::invalid_input(format!(
                "{ty} symbols cannot live in the global namespace"
            )));
        };
        let record = self.store.get(id)?.ok_or_else(|| {
            SymbolError::invalid_input(format!("namespace {namespace} does not exist"))
        })?;
        let parent_ty = record
            .symbol_type()
            .filter(|t| t.is_namespace())
            .ok_or_else(|| SymbolError::invalid_input(format!("{id} is not a namespace")))?;
        if !self.rules.is_valid_parent(ty, Some(parent_ty)) {
            return Err(SymbolError::invalid_input(format!(
                "{ty} symbols cannot live in a {parent_ty}"
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Namespaces and names
    // -----------------------------------------------------------------------

    /// Records of `namespace` and its enclosing namespaces, innermost first.
    ///
    /// Fails with `CircularDependency` if the chain revisits a namespace or
    /// exceeds the configured depth.
    pub(crate) fn ancestors(&self, namespace: Namespace) -> SymbolResult<Vec<SymbolRecord>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = namespace;
        while let Some(id) = current.symbol_id() {
            if !visited.insert(id) || chain.len() >= self.config.max_namespace_depth {
                return Err(SymbolError::circular(format!(
                    "namespace chain above {namespace} never reaches the global namespace"
                )));
            }
            let Some(record) = self.store.get(id)? else {
                break;
            };
            current = record.parent;
            chain.push(record);
        }
        Ok(chain)
    }

    /// Names of `namespace` and its ancestors, outermost first. Empty for global.
    pub fn namespace_path(&self, namespace: Namespace) -> SymbolResult<Vec<String>> {
        let _guard = self.lock();
        self.ancestors(namespace)?
            .iter()
            .rev()
            .map(|r| self.display_name(r))
            .collect()
    }

    pub(crate) fn namespace_display(&self, namespace: Namespace) -> String {
        match namespace {
            Namespace::Global => namespace.to_string(),
            Namespace::Symbol(_) => self
                .namespace_path(namespace)
                .map(|path| path.join(NAMESPACE_DELIMITER))
                .unwrap_or_else(|_| namespace.to_string()),
        }
    }

    /// Name of a record, deriving it for DEFAULT-source records.
    pub(crate) fn display_name(&self, record: &SymbolRecord) -> SymbolResult<String> {
        let mut current = record.clone();
        let mut visited = HashSet::from([record.id]);
        for _ in 0..self.config.max_namespace_depth {
            if current.source() != SourceType::Default {
                return Ok(current.name);
            }
            let Some(target) = self.rules.name_derived_from(&current) else {
                break;
            };
            if !visited.insert(target) {
                break;
            }
            match self.store.get(target)? {
                Some(next) => current = next,
                None => break,
            }
        }
        let ty = current.symbol_type().unwrap_or(SymbolType::Label);
        Ok(self.rules.default_name(ty, current.address, current.data2))
    }

    /// DEFAULT-named symbols whose displayed name comes from `symbol`.
    pub(crate) fn dynamic_dependents(&self, symbol: &Symbol) -> SymbolResult<Vec<Arc<Symbol>>> {
        let Some(id) = symbol.id() else {
            return Ok(Vec::new());
        };
        if symbol.symbol_type() != SymbolType::Function {
            return Ok(Vec::new());
        }
        let mut dependents = Vec::new();
        for record in self.store.scan()? {
            if self.rules.name_derived_from(&record) == Some(id) {
                if let Some(dependent) = self.symbol(record.id)? {
                    dependents.push(dependent);
                }
            }
        }
        Ok(dependents)
    }

    // -----------------------------------------------------------------------
    // Primary bookkeeping
    // -----------------------------------------------------------------------

    pub(crate) fn is_sole_symbol_at(
        &self,
        address: Address,
        id: Option<SymbolId>,
    ) -> SymbolResult<bool> {
        Ok(self
            .store
            .records_at(address)?
            .iter()
            .all(|r| Some(r.id) == id))
    }

    fn claim_primary(&self, address: Address, id: SymbolId, ty: SymbolType) {
        if self.rules.capabilities(ty).can_be_primary && self.context.primary_at(address).is_none()
        {
            self.context.set_primary(address, Some(id));
        }
    }

    pub(crate) fn move_primary(&self, from: Address, to: Address, id: SymbolId) {
        if self.context.primary_at(from) != Some(id) {
            return;
        }
        self.context.set_primary(from, None);
        if self.context.primary_at(to).is_none() {
            self.context.set_primary(to, Some(id));
        }
    }

    // -----------------------------------------------------------------------
    // Promotion and removal
    // -----------------------------------------------------------------------

    /// Turn a dynamic symbol into a persisted one named `name` in `namespace`.
    pub(crate) fn promote(
        &self,
        symbol: &Symbol,
        name: &str,
        namespace: Namespace,
        source: SourceType,
    ) -> SymbolResult<()> {
        let _guard = self.lock();
        let old_key = symbol.key();
        let address = symbol.address_now();
        let ty = symbol.symbol_type();
        let old_name = symbol.name_in(self)?;

        let id = self.store.allocate_key()?;
        let record = SymbolRecord::new(id, ty, address, name, namespace, source);
        if let Err(err) = self.store.update(&record) {
            tracing::warn!(symbol = %old_key, error = %err, "dynamic symbol promotion failed");
            return Err(err.into());
        }
        symbol.install_record(record, self.store.modification_count());

        let key = ProxyKey::Persisted(id);
        self.cache.remap(old_key, key);
        self.history.rekey(old_key, id);
        self.claim_primary(address, id, ty);

        let new_name = symbol.name_in(self)?;
        self.history
            .record(address, key, HistoryAction::Added, &new_name);
        self.emit(key, address, SymbolChange::Added);
        if !namespace.is_global() {
            self.emit(
                key,
                address,
                SymbolChange::NamespaceChanged {
                    old: Namespace::Global,
                    new: namespace,
                },
            );
        }
        if new_name != old_name {
            self.emit(
                key,
                address,
                SymbolChange::Renamed {
                    old: old_name,
                    new: new_name,
                },
            );
        }
        tracing::debug!(from = %old_key, symbol = %id, "dynamic symbol promoted");
        Ok(())
    }

    /// Remove a persisted symbol, its namespace members first.
    pub(crate) fn remove_symbol(&self, symbol: &Symbol) -> SymbolResult<bool> {
        let _guard = self.lock();
        let Some(record) = symbol.record_now() else {
            return Ok(false);
        };
        let id = record.id;
        let address = record.address;
        let key = ProxyKey::Persisted(id);

        if symbol.symbol_type().is_namespace() {
            for child in self.store.records_in(Namespace::Symbol(id))? {
                if let Some(child) = self.symbol(child.id)? {
                    if !child.is_deleting() {
                        child.delete()?;
                    }
                }
            }
        }

        let name = self.display_name(&record)?;
        let removed = match self.store.remove(id) {
            Ok(removed) => removed,
            Err(err) => {
                tracing::warn!(symbol = %id, error = %err, "symbol removal failed");
                return Err(err.into());
            }
        };
        symbol.invalidate();
        self.cache.remove(key);

        if self.context.primary_at(address) == Some(id) {
            let successor = self
                .store
                .records_at(address)?
                .into_iter()
                .find(|r| {
                    r.symbol_type()
                        .is_some_and(|t| self.rules.capabilities(t).can_be_primary)
                })
                .map(|r| r.id);
            self.context.set_primary(address, successor);
        }
        let retargeted = self.references.retarget(address, id, RefOwner::Primary);

        self.history
            .record(address, key, HistoryAction::Removed, &name);
        self.emit(key, address, SymbolChange::Removed { name });
        tracing::debug!(symbol = %id, retargeted, "symbol removed");
        Ok(removed)
    }

    pub(crate) fn emit(&self, symbol: ProxyKey, address: Address, change: SymbolChange) {
        self.notifier.emit(&ChangeEvent {
            symbol,
            address,
            change,
        });
    }
}

impl std::fmt::Debug for SymbolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolRegistry")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLog;

    #[test]
    fn create_and_lookup_by_id() {
        let registry = SymbolRegistry::new();
        let sym = registry
            .create_symbol(SymbolSpec::label("start", Address::ram(0x1000)))
            .unwrap();
        let id = sym.id().unwrap();
        let found = registry.symbol(id).unwrap().unwrap();
        assert!(Arc::ptr_eq(&sym, &found));
        assert_eq!(found.name().unwrap(), "start");
    }

    #[test]
    fn first_code_symbol_becomes_primary() {
        let registry = SymbolRegistry::new();
        let addr = Address::ram(0x2000);
        let first = registry.create_symbol(SymbolSpec::label("a", addr)).unwrap();
        let second = registry.create_symbol(SymbolSpec::label("b", addr)).unwrap();
        assert!(first.is_primary().unwrap());
        assert!(!second.is_primary().unwrap());
        let at = registry.symbols_at(addr).unwrap();
        assert_eq!(at.len(), 2);
        assert!(Arc::ptr_eq(&at[0], &first));
    }

    #[test]
    fn namespace_rejects_ineligible_child() {
        let registry = SymbolRegistry::new();
        let lib = registry.create_symbol(SymbolSpec::library("libc")).unwrap();
        let err = registry
            .create_symbol(
                SymbolSpec::label("x", Address::ram(0x10))
                    .in_namespace(Namespace::from(lib.id().unwrap())),
            )
            .unwrap_err();
        assert!(matches!(err, SymbolError::InvalidInput { .. }));
        assert!(!registry
            .is_valid_parent(SymbolType::Library, Namespace::from(lib.id().unwrap()))
            .unwrap());
    }

    #[test]
    fn missing_namespace_is_invalid_input() {
        let registry = SymbolRegistry::new();
        let ghost = Namespace::from(SymbolId::new(99).unwrap());
        let err = registry
            .create_symbol(SymbolSpec::label("x", Address::ram(0x10)).in_namespace(ghost))
            .unwrap_err();
        assert!(matches!(err, SymbolError::InvalidInput { .. }));
    }

    #[test]
    fn symbols_in_tracks_membership() {
        let registry = SymbolRegistry::new();
        let ns = registry.create_symbol(SymbolSpec::namespace("net")).unwrap();
        let scope = Namespace::from(ns.id().unwrap());
        assert!(registry.symbols_in(scope).unwrap().is_empty());
        registry
            .create_symbol(SymbolSpec::function("connect", Address::ram(0x10)).in_namespace(scope))
            .unwrap();
        let members = registry.symbols_in(scope).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name().unwrap(), "connect");
    }

    #[test]
    fn default_source_record_displays_derived_name() {
        let registry = SymbolRegistry::new();
        let sym = registry
            .create_symbol(
                SymbolSpec::function("", Address::ram(0x401000)).with_source(SourceType::Default),
            )
            .unwrap();
        assert_eq!(sym.name().unwrap(), "FUN_00401000");
        assert_eq!(registry.store().get(sym.id().unwrap()).unwrap().unwrap().name, "");
    }

    #[test]
    fn info_reports_counts() {
        let log = Arc::new(EventLog::new());
        let registry = SymbolRegistry::builder().notifier(log.clone()).build();
        registry
            .create_symbol(SymbolSpec::label("a", Address::ram(1)))
            .unwrap();
        let info = registry.info().unwrap();
        assert_eq!(info.symbols, 1);
        assert!(!info.persistent);
        assert!(info.to_string().contains("memory-only"));
        assert_eq!(log.len(), 1);
    }
}
