//! Live symbol proxies.
//!
//! A [`Symbol`] is the one in-memory object for a symbol key. It wraps the
//! persisted [`SymbolRecord`] (or nothing, for a dynamic symbol whose identity
//! is just an address) and routes every read and mutation through the owning
//! [`SymbolRegistry`]:
//!
//! 1. take the registry-wide reentrant lock,
//! 2. re-validate against the record store (lazy refresh),
//! 3. perform the operation and write through.
//!
//! Proxies hold only a weak back-reference to the registry; once the registry
//! is dropped every call fails with [`SymbolError::IllegalState`].

use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::address::Address;
use crate::error::{SymbolError, SymbolResult};
use crate::event::SymbolChange;
use crate::history::HistoryAction;
use crate::monitor::TaskMonitor;
use crate::name::{self, NAMESPACE_DELIMITER};
use crate::record::SymbolRecord;
use crate::reference::{RefOwner, Reference};
use crate::registry::SymbolRegistry;
use crate::symbol::{Namespace, ProxyKey, SourceType, SymbolId, SymbolType};

/// Mutable per-proxy state. Never locked across calls into other proxies.
#[derive(Debug)]
struct ProxyState {
    key: ProxyKey,
    /// `None` for a dynamic symbol.
    record: Option<SymbolRecord>,
    address: Address,
    /// Store modification count at the last successful validation.
    validated_at: u64,
    deleted: bool,
    deleting: bool,
}

/// A live handle on one symbol.
pub struct Symbol {
    registry: Weak<SymbolRegistry>,
    symbol_type: SymbolType,
    state: Mutex<ProxyState>,
}

impl Symbol {
    pub(crate) fn from_record(
        registry: Weak<SymbolRegistry>,
        record: SymbolRecord,
        validated_at: u64,
    ) -> SymbolResult<Self> {
        let symbol_type = record.symbol_type().ok_or_else(|| {
            SymbolError::illegal_state(format!(
                "record {} has unknown type tag {}",
                record.id, record.type_tag
            ))
        })?;
        Ok(Self {
            registry,
            symbol_type,
            state: Mutex::new(ProxyState {
                key: ProxyKey::Persisted(record.id),
                address: record.address,
                record: Some(record),
                validated_at,
                deleted: false,
                deleting: false,
            }),
        })
    }

    pub(crate) fn dynamic(registry: Weak<SymbolRegistry>, address: Address) -> Self {
        Self {
            registry,
            symbol_type: SymbolType::Label,
            state: Mutex::new(ProxyState {
                key: ProxyKey::Dynamic(address),
                record: None,
                address,
                validated_at: 0,
                deleted: false,
                deleting: false,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Lock-free identity
    // -----------------------------------------------------------------------

    /// Cache identity. Changes once, when a dynamic symbol is promoted.
    pub fn key(&self) -> ProxyKey {
        self.state.lock().key
    }

    /// Persisted id, `None` while dynamic.
    pub fn id(&self) -> Option<SymbolId> {
        self.key().symbol_id()
    }

    pub fn symbol_type(&self) -> SymbolType {
        self.symbol_type
    }

    /// Whether this symbol has no record and derives everything from its address.
    pub fn is_dynamic(&self) -> bool {
        let state = self.state.lock();
        state.record.is_none() && !state.deleted
    }

    /// Whether a [`delete`](Self::delete) of this symbol is in progress.
    pub(crate) fn is_deleting(&self) -> bool {
        self.state.lock().deleting
    }

    /// Whether the proxy still refers to a live symbol.
    pub fn is_valid(&self) -> bool {
        let Ok(registry) = self.registry() else {
            return false;
        };
        let _guard = registry.lock();
        self.check_valid(&registry).is_ok()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn address(&self) -> SymbolResult<Address> {
        self.with_valid(|_| Ok(self.address_now()))
    }

    /// Display name; dynamic and DEFAULT-source symbols derive it.
    pub fn name(&self) -> SymbolResult<String> {
        self.with_valid(|reg| self.name_in(reg))
    }

    /// Name optionally prefixed with the `::`-joined namespace path.
    pub fn name_with_namespace(&self, include_namespace: bool) -> SymbolResult<String> {
        if !include_namespace {
            return self.name();
        }
        Ok(self.path()?.join(NAMESPACE_DELIMITER))
    }

    /// Names from the outermost non-global namespace down to this symbol.
    pub fn path(&self) -> SymbolResult<Vec<String>> {
        self.with_valid(|reg| {
            let mut path = reg.namespace_path(self.parent_now())?;
            path.push(self.name_in(reg)?);
            Ok(path)
        })
    }

    pub fn parent_namespace(&self) -> SymbolResult<Namespace> {
        self.with_valid(|_| Ok(self.parent_now()))
    }

    /// The symbol of the parent namespace, `None` for global.
    pub fn parent_symbol(&self) -> SymbolResult<Option<Arc<Symbol>>> {
        self.with_valid(|reg| match self.parent_now().symbol_id() {
            Some(id) => reg.symbol(id),
            None => Ok(None),
        })
    }

    pub fn is_global(&self) -> SymbolResult<bool> {
        self.with_valid(|_| Ok(self.parent_now().is_global()))
    }

    pub fn source(&self) -> SymbolResult<SourceType> {
        self.with_valid(|_| Ok(self.source_now()))
    }

    pub fn is_pinned(&self) -> SymbolResult<bool> {
        self.with_valid(|reg| {
            if !reg.rules().supports_pinning(self.symbol_type) {
                return Ok(false);
            }
            Ok(self.record_now().is_some_and(|r| r.is_pinned()))
        })
    }

    pub fn symbol_data1(&self) -> SymbolResult<i64> {
        self.with_valid(|_| Ok(self.record_now().map_or(0, |r| r.data1)))
    }

    pub fn symbol_data2(&self) -> SymbolResult<i32> {
        self.with_valid(|_| Ok(self.record_now().map_or(0, |r| r.data2)))
    }

    pub fn symbol_data3(&self) -> SymbolResult<Option<String>> {
        self.with_valid(|_| Ok(self.record_now().and_then(|r| r.data3)))
    }

    /// Whether this symbol is the primary symbol at its address.
    ///
    /// Dynamic symbols are always primary: nothing else exists at their address.
    pub fn is_primary(&self) -> SymbolResult<bool> {
        self.with_valid(|reg| Ok(self.is_primary_in(reg)))
    }

    pub fn is_external_entry_point(&self) -> SymbolResult<bool> {
        self.with_valid(|reg| Ok(reg.context().is_external_entry_point(self.address_now())))
    }

    /// Whether `namespace` is this symbol's own namespace or nested inside it.
    pub fn is_descendant(&self, namespace: Namespace) -> SymbolResult<bool> {
        self.with_valid(|reg| self.contains_namespace(reg, namespace))
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    pub fn reference_count(&self) -> SymbolResult<usize> {
        self.with_valid(|reg| self.count_owned(reg, usize::MAX))
    }

    pub fn has_references(&self) -> SymbolResult<bool> {
        self.with_valid(|reg| Ok(self.count_owned(reg, 1)? >= 1))
    }

    pub fn has_multiple_references(&self) -> SymbolResult<bool> {
        self.with_valid(|reg| Ok(self.count_owned(reg, 2)? >= 2))
    }

    /// References owned by this symbol.
    ///
    /// The monitor is polled before each reference; on cancellation the
    /// references found so far are returned. The registry lock is held for the
    /// whole scan.
    pub fn references(&self, monitor: &dyn TaskMonitor) -> SymbolResult<Vec<Reference>> {
        self.with_valid(|reg| {
            let address = self.address_now();
            let index = reg.references();
            if monitor.maximum() == 0 {
                monitor.initialize(index.reference_count_to(address) as u64);
            }
            let owns = self.ownership(reg);
            let mut found = Vec::new();
            for (step, reference) in index.references_to(address).enumerate() {
                if monitor.is_cancelled() {
                    tracing::debug!(symbol = %self.key(), found = found.len(), "reference scan cancelled");
                    break;
                }
                if owns(&reference) {
                    found.push(reference);
                }
                monitor.set_progress(step as u64 + 1);
            }
            Ok(found)
        })
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Change the source type without touching the name.
    ///
    /// Moving into or out of [`SourceType::Default`] changes how the name is
    /// stored and must go through a rename instead.
    pub fn set_source(&self, source: SourceType) -> SymbolResult<()> {
        self.with_valid(|reg| {
            let old = self.source_now();
            if old == source {
                return Ok(());
            }
            if (old == SourceType::Default) != (source == SourceType::Default) {
                return Err(SymbolError::invalid_input(format!(
                    "cannot change source of {} from {old} to {source} without renaming",
                    self.key()
                )));
            }
            let name = self.name_in(reg)?;
            reg.validate_source(&name, self.address_now(), self.symbol_type, source)?;
            self.write_record(reg, |r| r.set_source(source))?;
            reg.emit(
                self.key(),
                self.address_now(),
                SymbolChange::SourceChanged { old, new: source },
            );
            Ok(())
        })
    }

    pub fn set_pinned(&self, pinned: bool) -> SymbolResult<()> {
        self.with_valid(|reg| {
            if !reg.rules().supports_pinning(self.symbol_type) {
                return Err(SymbolError::unsupported(format!(
                    "{} symbols cannot be pinned",
                    self.symbol_type
                )));
            }
            let Some(record) = self.record_now() else {
                return Ok(());
            };
            if record.is_pinned() == pinned {
                return Ok(());
            }
            self.write_record(reg, |r| r.set_pinned(pinned))?;
            reg.emit(
                self.key(),
                self.address_now(),
                SymbolChange::AnchoredFlagChanged { pinned },
            );
            Ok(())
        })
    }

    /// Rename and/or reparent in one step.
    ///
    /// A DEFAULT source (requested, or implied by an empty or address-derived
    /// name) clears the stored name. A dynamic symbol is promoted to a persisted
    /// one.
    pub fn set_name_and_namespace(
        &self,
        name: &str,
        namespace: Namespace,
        source: SourceType,
    ) -> SymbolResult<()> {
        self.with_valid(|reg| {
            let ty = self.symbol_type;
            let address = self.address_now();
            let old_name = self.name_in(reg)?;
            self.check_edit_ok(reg, &old_name)?;

            let source = reg.rules().adjust_source(ty, name, address, source);
            reg.validate_source(name, address, ty, source)?;

            let old_namespace = self.parent_now();
            let namespace_change = old_namespace != namespace;
            if namespace_change {
                reg.check_parent(ty, namespace)?;
                if self.contains_namespace(reg, namespace)? {
                    return Err(SymbolError::circular(format!(
                        "{old_name} cannot be moved into {}, which it contains",
                        reg.namespace_display(namespace)
                    )));
                }
            }

            let old_source = self.source_now();
            let (new_name, name_change) = if source == SourceType::Default {
                if old_source == SourceType::Default && !namespace_change {
                    return Ok(());
                }
                (String::new(), old_source != SourceType::Default)
            } else {
                name::validate_name(name, reg.config().max_name_length)?;
                let name_change = old_name != name;
                if !name_change && !namespace_change {
                    return Ok(());
                }
                reg.check_duplicate_name(address, name, namespace, ty, self.id())?;
                (name.to_string(), name_change)
            };

            if self.is_dynamic() {
                return reg.promote(self, &new_name, namespace, source);
            }

            let dependents = reg.dynamic_dependents(self)?;
            let dependent_names = dependents
                .iter()
                .map(|dep| dep.name())
                .collect::<SymbolResult<Vec<_>>>()?;

            self.write_record(reg, |r| {
                r.parent = namespace;
                r.name = new_name;
                r.set_source(source);
            })?;

            let key = self.key();
            if namespace_change {
                reg.emit(
                    key,
                    address,
                    SymbolChange::NamespaceChanged {
                        old: old_namespace,
                        new: namespace,
                    },
                );
            }
            if name_change {
                let current = self.name_in(reg)?;
                reg.history().record(
                    address,
                    key,
                    HistoryAction::Renamed,
                    &format!("{old_name} to {current}"),
                );
                reg.emit(
                    key,
                    address,
                    SymbolChange::Renamed {
                        old: old_name,
                        new: current,
                    },
                );
                for (dependent, old) in dependents.iter().zip(dependent_names) {
                    let new = dependent.name()?;
                    reg.emit(
                        dependent.key(),
                        dependent.address()?,
                        SymbolChange::Renamed { old, new },
                    );
                }
            }
            tracing::debug!(symbol = %key, namespace = %namespace, "symbol renamed");
            Ok(())
        })
    }

    pub fn set_name(&self, name: &str, source: SourceType) -> SymbolResult<()> {
        self.with_valid(|_| self.set_name_and_namespace(name, self.parent_now(), source))
    }

    pub fn set_namespace(&self, namespace: Namespace) -> SymbolResult<()> {
        self.with_valid(|reg| {
            let name = self.name_in(reg)?;
            self.set_name_and_namespace(&name, namespace, self.source_now())
        })
    }

    /// Move a variable-like symbol to a new storage address.
    pub fn set_address(&self, address: Address) -> SymbolResult<()> {
        self.with_valid(|reg| {
            if !reg.rules().supports_address_change(self.symbol_type) {
                return Err(SymbolError::illegal_state(format!(
                    "{} symbols cannot change address",
                    self.symbol_type
                )));
            }
            let old = self.address_now();
            if old == address {
                return Ok(());
            }
            self.write_record(reg, |r| r.address = address)?;
            reg.emit(
                self.key(),
                address,
                SymbolChange::AddressChanged { old, new: address },
            );
            Ok(())
        })
    }

    /// Relocate this symbol as part of moving the block at `old_base` to `new_base`.
    pub fn move_address(&self, old_base: Address, new_base: Address) -> SymbolResult<()> {
        self.with_valid(|reg| {
            let current = self.address_now();
            let Some(delta) = current.subtract(old_base) else {
                return Ok(());
            };
            let moved = new_base.add_wrap(delta);
            if moved == current {
                return Ok(());
            }
            if self.is_dynamic() {
                self.relocate_dynamic(moved);
                reg.cache()
                    .remap(ProxyKey::Dynamic(current), ProxyKey::Dynamic(moved));
            } else {
                self.write_record(reg, |r| r.address = moved)?;
                if let Some(id) = self.id() {
                    reg.move_primary(current, moved, id);
                }
            }
            reg.history().move_address(current, moved);
            Ok(())
        })
    }

    pub fn set_symbol_data1(&self, value: i64) -> SymbolResult<()> {
        self.with_valid(|reg| match self.record_now() {
            Some(record) if record.data1 != value => self.write_data(reg, |r| r.data1 = value),
            _ => Ok(()),
        })
    }

    pub fn set_symbol_data2(&self, value: i32) -> SymbolResult<()> {
        self.with_valid(|reg| match self.record_now() {
            Some(record) if record.data2 != value => self.write_data(reg, |r| r.data2 = value),
            _ => Ok(()),
        })
    }

    pub fn set_symbol_data3(&self, value: Option<&str>) -> SymbolResult<()> {
        self.with_valid(|reg| match self.record_now() {
            Some(record) if record.data3.as_deref() != value => {
                self.write_data(reg, |r| r.data3 = value.map(str::to_string))
            }
            _ => Ok(()),
        })
    }

    /// Make this symbol the primary symbol at its address.
    ///
    /// Returns whether the primary changed; types that cannot be primary and
    /// dynamic symbols return `false`.
    pub fn set_primary(&self) -> SymbolResult<bool> {
        self.with_valid(|reg| {
            let Some(id) = self.id() else {
                return Ok(false);
            };
            if !reg.rules().capabilities(self.symbol_type).can_be_primary {
                return Ok(false);
            }
            let address = self.address_now();
            let previous = reg.context().primary_at(address);
            if previous == Some(id) {
                return Ok(false);
            }
            reg.context().set_primary(address, Some(id));
            reg.emit(
                self.key(),
                address,
                SymbolChange::PrimaryChanged {
                    previous: previous.map(ProxyKey::Persisted),
                },
            );
            Ok(true)
        })
    }

    /// Remove this symbol (and, for namespaces, everything inside it).
    ///
    /// Returns whether a record was removed. Deleting an already deleted or a
    /// dynamic symbol is not an error and returns `false`.
    pub fn delete(&self) -> SymbolResult<bool> {
        let registry = self.registry()?;
        let _guard = registry.lock();
        if self.is_deleting() {
            return Ok(false);
        }
        let _deleting = DeletingGuard::enter(self);
        match self.check_valid(&registry) {
            Ok(()) => {}
            Err(SymbolError::IllegalState { .. }) => return Ok(false),
            Err(err) => return Err(err),
        }
        if self.is_dynamic() {
            return Ok(false);
        }
        registry.remove_symbol(self)
    }

    /// Structural equality: same name, address, type and (recursively) parent.
    ///
    /// Invalid proxies are equal to nothing, themselves included.
    pub fn structurally_equal(&self, other: &Symbol) -> SymbolResult<bool> {
        if !self.is_valid() || !other.is_valid() {
            return Ok(false);
        }
        if std::ptr::eq(self, other) {
            return Ok(true);
        }
        if !shallow_eq(self, other)? {
            return Ok(false);
        }
        let depth = self.registry()?.config().max_namespace_depth;
        let mut pair = (self.parent_symbol()?, other.parent_symbol()?);
        for _ in 0..depth {
            match pair {
                (None, None) => return Ok(true),
                (Some(a), Some(b)) => {
                    if Arc::ptr_eq(&a, &b) {
                        return Ok(true);
                    }
                    if !shallow_eq(&a, &b)? {
                        return Ok(false);
                    }
                    pair = (a.parent_symbol()?, b.parent_symbol()?);
                }
                _ => return Ok(false),
            }
        }
        Ok(false)
    }

    // -----------------------------------------------------------------------
    // Crate-internal protocol
    // -----------------------------------------------------------------------

    fn registry(&self) -> SymbolResult<Arc<SymbolRegistry>> {
        self.registry
            .upgrade()
            .ok_or_else(|| SymbolError::illegal_state("symbol registry has been dropped"))
    }

    fn with_valid<T>(&self, op: impl FnOnce(&SymbolRegistry) -> SymbolResult<T>) -> SymbolResult<T> {
        let registry = self.registry()?;
        let _guard = registry.lock();
        self.check_valid(&registry)?;
        op(&registry)
    }

    /// Lazy refresh. Caller holds the registry lock.
    pub(crate) fn check_valid(&self, reg: &SymbolRegistry) -> SymbolResult<()> {
        let seen = reg.store().modification_count();
        let mut state = self.state.lock();
        if state.deleted {
            return Err(SymbolError::illegal_state(format!(
                "symbol {} has been deleted",
                state.key
            )));
        }
        let Some(record) = state.record.as_ref() else {
            return Ok(());
        };
        if state.validated_at == seen {
            return Ok(());
        }
        let (id, tag) = (record.id, record.type_tag);
        match reg.store().get(id)? {
            Some(fresh) if fresh.type_tag == tag => {
                state.address = fresh.address;
                state.record = Some(fresh);
                state.validated_at = seen;
                Ok(())
            }
            _ => {
                state.deleted = true;
                state.record = None;
                let key = state.key;
                drop(state);
                reg.cache().evict(key, self);
                tracing::debug!(symbol = %key, "record vanished, proxy invalidated");
                Err(SymbolError::illegal_state(format!(
                    "symbol {key} no longer exists in the record store"
                )))
            }
        }
    }

    /// Mark deleted. Caller holds the registry lock.
    pub(crate) fn invalidate(&self) {
        let mut state = self.state.lock();
        state.deleted = true;
        state.record = None;
    }

    /// Attach the freshly written record of a promoted dynamic symbol.
    pub(crate) fn install_record(&self, record: SymbolRecord, validated_at: u64) {
        let mut state = self.state.lock();
        state.key = ProxyKey::Persisted(record.id);
        state.address = record.address;
        state.record = Some(record);
        state.validated_at = validated_at;
    }

    pub(crate) fn record_now(&self) -> Option<SymbolRecord> {
        self.state.lock().record.clone()
    }

    pub(crate) fn address_now(&self) -> Address {
        self.state.lock().address
    }

    fn parent_now(&self) -> Namespace {
        self.state
            .lock()
            .record
            .as_ref()
            .map_or(Namespace::Global, |r| r.parent)
    }

    fn source_now(&self) -> SourceType {
        self.state
            .lock()
            .record
            .as_ref()
            .map_or(SourceType::Default, |r| r.source())
    }

    fn relocate_dynamic(&self, to: Address) {
        let mut state = self.state.lock();
        state.address = to;
        state.key = ProxyKey::Dynamic(to);
    }

    pub(crate) fn name_in(&self, reg: &SymbolRegistry) -> SymbolResult<String> {
        match self.record_now() {
            Some(record) => reg.display_name(&record),
            None => Ok(reg
                .rules()
                .default_name(self.symbol_type, self.address_now(), 0)),
        }
    }

    pub(crate) fn is_primary_in(&self, reg: &SymbolRegistry) -> bool {
        match self.id() {
            None => true,
            Some(id) => {
                reg.rules().capabilities(self.symbol_type).can_be_primary
                    && reg.context().primary_at(self.address_now()) == Some(id)
            }
        }
    }

    fn contains_namespace(&self, reg: &SymbolRegistry, namespace: Namespace) -> SymbolResult<bool> {
        let Some(me) = self.id() else {
            return Ok(false);
        };
        match reg.ancestors(namespace) {
            Ok(chain) => Ok(chain.iter().any(|r| r.id == me)),
            // A chain that never reaches the root cannot be proven free of us.
            Err(SymbolError::CircularDependency { .. }) => Ok(true),
            Err(err) => Err(err),
        }
    }

    /// Register symbols are named after the register and cannot be renamed.
    fn check_edit_ok(&self, reg: &SymbolRegistry, current_name: &str) -> SymbolResult<()> {
        if self.symbol_type == SymbolType::Label
            && reg
                .context()
                .register_names_at(self.address_now())
                .iter()
                .any(|r| r == current_name)
        {
            return Err(SymbolError::invalid_input(format!(
                "register symbol {current_name} cannot be renamed"
            )));
        }
        Ok(())
    }

    fn ownership(&self, reg: &SymbolRegistry) -> impl Fn(&Reference) -> bool + use<> {
        let id = self.id();
        let primary = self.is_primary_in(reg);
        move |reference: &Reference| match reference.owner {
            RefOwner::Symbol(owner) => Some(owner) == id,
            RefOwner::Primary => primary,
        }
    }

    fn count_owned(&self, reg: &SymbolRegistry, limit: usize) -> SymbolResult<usize> {
        let address = self.address_now();
        if reg.is_sole_symbol_at(address, self.id())? {
            return Ok(reg.references().reference_count_to(address).min(limit));
        }
        let owns = self.ownership(reg);
        Ok(reg
            .references()
            .references_to(address)
            .filter(|r| owns(r))
            .take(limit)
            .count())
    }

    fn write_record(
        &self,
        reg: &SymbolRegistry,
        mutate: impl FnOnce(&mut SymbolRecord),
    ) -> SymbolResult<()> {
        let Some(mut record) = self.record_now() else {
            return Err(SymbolError::illegal_state(format!(
                "dynamic symbol {} has no record to write",
                self.key()
            )));
        };
        mutate(&mut record);
        if let Err(err) = reg.store().update(&record) {
            tracing::warn!(symbol = %record.id, error = %err, "symbol write failed");
            return Err(err.into());
        }
        let mut state = self.state.lock();
        state.address = record.address;
        state.record = Some(record);
        state.validated_at = reg.store().modification_count();
        Ok(())
    }

    fn write_data(&self, reg: &SymbolRegistry, mutate: impl FnOnce(&mut SymbolRecord)) -> SymbolResult<()> {
        self.write_record(reg, mutate)?;
        reg.emit(self.key(), self.address_now(), SymbolChange::DataChanged);
        Ok(())
    }
}

fn shallow_eq(a: &Symbol, b: &Symbol) -> SymbolResult<bool> {
    Ok(a.symbol_type == b.symbol_type && a.address()? == b.address()? && a.name()? == b.name()?)
}

/// Sets the deleting flag for the lifetime of a `delete` call.
struct DeletingGuard<'a> {
    symbol: &'a Symbol,
}

impl<'a> DeletingGuard<'a> {
    fn enter(symbol: &'a Symbol) -> Self {
        symbol.state.lock().deleting = true;
        Self { symbol }
    }
}

impl Drop for DeletingGuard<'_> {
    fn drop(&mut self) {
        self.symbol.state.lock().deleting = false;
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_equal(other).unwrap_or(false)
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Ok(name) => f.write_str(&name),
            Err(_) => write!(f, "<invalid {}>", self.key()),
        }
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Symbol")
            .field("key", &state.key)
            .field("type", &self.symbol_type)
            .field("address", &state.address)
            .field("deleted", &state.deleted)
            .finish()
    }
}
