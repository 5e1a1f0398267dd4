//! Per-type capability table.
//!
//! What a symbol may do depends on its [`SymbolType`]: only code-like symbols
//! can be pinned, only variables can change address, only some types accept a
//! DEFAULT (address-derived) name, and each type admits a fixed set of parent
//! namespace kinds. [`StandardTypeRules`] encodes that table; alternative rule
//! sets plug in through [`TypeRules`].

use crate::address::Address;
use crate::name;
use crate::record::SymbolRecord;
use crate::symbol::{SourceType, SymbolId, SymbolType};

/// Capability row for one symbol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeCapabilities {
    pub supports_pinning: bool,
    pub supports_address_change: bool,
    /// Whether the type may carry a DEFAULT source (and so an empty stored name).
    pub allows_default_source: bool,
    /// Whether the symbol may be the primary symbol at its address.
    pub can_be_primary: bool,
    /// Whether the symbol is bound to a real address (otherwise `NO_ADDRESS`).
    pub located: bool,
    /// Prefix of the address-derived default name.
    pub default_prefix: Option<&'static str>,
    /// Whether the global namespace is an eligible parent.
    pub global_parent: bool,
    /// Namespace-capable types that are eligible parents.
    pub parent_types: &'static [SymbolType],
}

const SCOPES: &[SymbolType] = &[SymbolType::Namespace, SymbolType::Class];

const LABEL: TypeCapabilities = TypeCapabilities {
    supports_pinning: true,
    supports_address_change: false,
    allows_default_source: true,
    can_be_primary: true,
    located: true,
    default_prefix: Some("LAB"),
    global_parent: true,
    parent_types: &[SymbolType::Namespace, SymbolType::Class, SymbolType::Function],
};

const FUNCTION: TypeCapabilities = TypeCapabilities {
    supports_pinning: true,
    supports_address_change: false,
    allows_default_source: true,
    can_be_primary: true,
    located: true,
    default_prefix: Some("FUN"),
    global_parent: true,
    parent_types: &[SymbolType::Namespace, SymbolType::Class, SymbolType::Library],
};

const LIBRARY: TypeCapabilities = TypeCapabilities {
    supports_pinning: false,
    supports_address_change: false,
    allows_default_source: false,
    can_be_primary: false,
    located: false,
    default_prefix: None,
    global_parent: true,
    parent_types: &[],
};

const NAMESPACE: TypeCapabilities = TypeCapabilities {
    supports_pinning: false,
    supports_address_change: false,
    allows_default_source: false,
    can_be_primary: false,
    located: false,
    default_prefix: None,
    global_parent: true,
    parent_types: &[
        SymbolType::Namespace,
        SymbolType::Class,
        SymbolType::Library,
        SymbolType::Function,
    ],
};

const CLASS: TypeCapabilities = TypeCapabilities {
    parent_types: &[SymbolType::Namespace, SymbolType::Class, SymbolType::Library],
    ..NAMESPACE
};

const VARIABLE: TypeCapabilities = TypeCapabilities {
    supports_pinning: false,
    supports_address_change: true,
    allows_default_source: true,
    can_be_primary: false,
    located: true,
    default_prefix: None,
    global_parent: false,
    parent_types: &[SymbolType::Function],
};

const GLOBAL_VAR: TypeCapabilities = TypeCapabilities {
    supports_pinning: false,
    supports_address_change: true,
    allows_default_source: false,
    can_be_primary: false,
    located: true,
    default_prefix: None,
    global_parent: true,
    parent_types: SCOPES,
};

/// Type-specific behavior consulted by proxies and the registry.
pub trait TypeRules: Send + Sync {
    fn capabilities(&self, ty: SymbolType) -> TypeCapabilities;

    /// Whether `parent` (`None` = global) may contain a symbol of type `ty`.
    fn is_valid_parent(&self, ty: SymbolType, parent: Option<SymbolType>) -> bool {
        let caps = self.capabilities(ty);
        match parent {
            None => caps.global_parent,
            Some(p) => p.is_namespace() && caps.parent_types.contains(&p),
        }
    }

    fn supports_pinning(&self, ty: SymbolType) -> bool {
        self.capabilities(ty).supports_pinning
    }

    fn supports_address_change(&self, ty: SymbolType) -> bool {
        self.capabilities(ty).supports_address_change
    }

    /// Adjust the requested source for a rename. An empty name or the type's own
    /// default name means "go back to the default".
    fn adjust_source(
        &self,
        ty: SymbolType,
        name: &str,
        address: Address,
        source: SourceType,
    ) -> SourceType {
        let caps = self.capabilities(ty);
        if !caps.allows_default_source || source == SourceType::Default {
            return source;
        }
        let is_default_form = caps
            .default_prefix
            .is_some_and(|prefix| name == name::default_name(prefix, address));
        if name.is_empty() || is_default_form {
            SourceType::Default
        } else {
            source
        }
    }

    /// The symbol a DEFAULT record borrows its name from, if any.
    ///
    /// A default-named function whose `data1` holds another function id is a
    /// thunk and displays the thunked function's name.
    fn name_derived_from(&self, record: &SymbolRecord) -> Option<SymbolId> {
        if record.symbol_type() != Some(SymbolType::Function)
            || record.source() != SourceType::Default
            || record.data1 <= 0
        {
            return None;
        }
        SymbolId::new(record.data1 as u64).filter(|target| *target != record.id)
    }

    /// Default name of a record (or dynamic symbol) that does not borrow one.
    fn default_name(&self, ty: SymbolType, address: Address, ordinal: i32) -> String {
        match ty {
            SymbolType::Parameter => format!("param_{}", i64::from(ordinal) + 1),
            SymbolType::LocalVar => format!("local_{:x}", address.offset()),
            _ => {
                let prefix = self.capabilities(ty).default_prefix.unwrap_or("UNK");
                name::default_name(prefix, address)
            }
        }
    }
}

/// The built-in capability table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTypeRules;

impl TypeRules for StandardTypeRules {
    fn capabilities(&self, ty: SymbolType) -> TypeCapabilities {
        match ty {
            SymbolType::Label => LABEL,
            SymbolType::Function => FUNCTION,
            SymbolType::Library => LIBRARY,
            SymbolType::Namespace => NAMESPACE,
            SymbolType::Class => CLASS,
            SymbolType::Parameter | SymbolType::LocalVar => VARIABLE,
            SymbolType::GlobalVar => GLOBAL_VAR,
        }
    }
}
