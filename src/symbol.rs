//! Core identity and classification types for symbols.
//!
//! Every persisted symbol is identified by a [`SymbolId`], classified by a
//! [`SymbolType`], and carries a [`SourceType`] describing where its name came
//! from. Symbols live in a [`Namespace`]; dynamic symbols (no record) are keyed
//! in the object cache by their address through [`ProxyKey`].

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::StoreError;

/// Unique, niche-optimized identifier for a persisted symbol.
///
/// Uses `NonZeroU64` so that `Option<SymbolId>` is the same size as `SymbolId`;
/// zero is reserved for the global namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SymbolId(NonZeroU64);

impl SymbolId {
    /// Create a `SymbolId` from a raw `u64`.
    ///
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(SymbolId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sym:{}", self.0)
    }
}

/// Kind of program element a symbol names. The byte tag is stored on disk and
/// never changes for the lifetime of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolType {
    Label,
    Library,
    Namespace,
    Class,
    Function,
    Parameter,
    LocalVar,
    GlobalVar,
}

impl SymbolType {
    pub const ALL: [SymbolType; 8] = [
        SymbolType::Label,
        SymbolType::Library,
        SymbolType::Namespace,
        SymbolType::Class,
        SymbolType::Function,
        SymbolType::Parameter,
        SymbolType::LocalVar,
        SymbolType::GlobalVar,
    ];

    /// On-disk type tag.
    pub fn tag(self) -> u8 {
        match self {
            SymbolType::Label => 0,
            SymbolType::Library => 1,
            SymbolType::Namespace => 3,
            SymbolType::Class => 4,
            SymbolType::Function => 5,
            SymbolType::Parameter => 6,
            SymbolType::LocalVar => 7,
            SymbolType::GlobalVar => 8,
        }
    }

    /// Decode an on-disk type tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        SymbolType::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Whether symbols of this type can own child symbols.
    pub fn is_namespace(self) -> bool {
        matches!(
            self,
            SymbolType::Library | SymbolType::Namespace | SymbolType::Class | SymbolType::Function
        )
    }
}

impl std::fmt::Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SymbolType::Label => "Label",
            SymbolType::Library => "Library",
            SymbolType::Namespace => "Namespace",
            SymbolType::Class => "Class",
            SymbolType::Function => "Function",
            SymbolType::Parameter => "Parameter",
            SymbolType::LocalVar => "Local Var",
            SymbolType::GlobalVar => "Global Var",
        };
        f.write_str(s)
    }
}

/// Provenance of a symbol name, in increasing order of confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceType {
    /// No real name; the name is derived from the address.
    Default,
    Analysis,
    Imported,
    UserDefined,
}

impl SourceType {
    /// Two-bit ordinal stored in the record flags.
    pub fn ordinal(self) -> u8 {
        match self {
            SourceType::Default => 0,
            SourceType::Analysis => 1,
            SourceType::Imported => 2,
            SourceType::UserDefined => 3,
        }
    }

    pub fn from_ordinal(bits: u8) -> Self {
        match bits & 0b11 {
            0 => SourceType::Default,
            1 => SourceType::Analysis,
            2 => SourceType::Imported,
            _ => SourceType::UserDefined,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceType::Default => "Default",
            SourceType::Analysis => "Analysis",
            SourceType::Imported => "Imported",
            SourceType::UserDefined => "User Defined",
        };
        f.write_str(s)
    }
}

/// Parent scope of a symbol: the global root, or a namespace-capable symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Namespace {
    #[default]
    Global,
    Symbol(SymbolId),
}

impl Namespace {
    /// Raw id as stored in the parent column; the global namespace is 0.
    pub fn raw_id(self) -> u64 {
        match self {
            Namespace::Global => 0,
            Namespace::Symbol(id) => id.get(),
        }
    }

    pub fn from_raw(raw: u64) -> Self {
        SymbolId::new(raw).map_or(Namespace::Global, Namespace::Symbol)
    }

    pub fn symbol_id(self) -> Option<SymbolId> {
        match self {
            Namespace::Global => None,
            Namespace::Symbol(id) => Some(id),
        }
    }

    pub fn is_global(self) -> bool {
        self == Namespace::Global
    }
}

impl From<SymbolId> for Namespace {
    fn from(id: SymbolId) -> Self {
        Namespace::Symbol(id)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Namespace::Global => f.write_str("Global"),
            Namespace::Symbol(id) => write!(f, "ns:{}", id.get()),
        }
    }
}

/// Object-cache identity of a proxy.
///
/// A dynamic symbol has no record and is identified by its address until it is
/// promoted, at which point its key is remapped to the freshly allocated id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKey {
    Persisted(SymbolId),
    Dynamic(Address),
}

impl ProxyKey {
    pub fn symbol_id(self) -> Option<SymbolId> {
        match self {
            ProxyKey::Persisted(id) => Some(id),
            ProxyKey::Dynamic(_) => None,
        }
    }
}

impl std::fmt::Display for ProxyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyKey::Persisted(id) => write!(f, "{id}"),
            ProxyKey::Dynamic(addr) => write!(f, "dyn:{addr}"),
        }
    }
}

/// Thread-safe symbol ID allocator.
///
/// Produces monotonically increasing IDs starting from 1. IDs are never handed
/// out twice, even after the symbol they named is deleted.
#[derive(Debug)]
pub struct AtomicSymbolAllocator {
    next: AtomicU64,
}

impl AtomicSymbolAllocator {
    /// Create a new allocator that starts from ID 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Create an allocator that resumes from a given ID.
    ///
    /// Useful when restoring state from persistent storage.
    pub fn starting_from(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start.max(1)),
        }
    }

    /// Allocate the next symbol ID.
    pub fn next_id(&self) -> Result<SymbolId, StoreError> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        SymbolId::new(raw).ok_or(StoreError::KeysExhausted)
    }

    /// Return the next ID that *would* be allocated, without consuming it.
    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for AtomicSymbolAllocator {
    fn default() -> Self {
        Self::new()
    }
}
