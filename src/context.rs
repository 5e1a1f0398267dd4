//! Program facts the symbol layer consults but does not own.
//!
//! Which symbol is primary at an address, which addresses are external entry
//! points, and which register names alias an address all live outside the
//! symbol table. [`ProgramContext`] is the narrow view the registry needs;
//! [`MemProgramContext`] keeps the facts in concurrent maps.

use dashmap::{DashMap, DashSet};

use crate::address::Address;
use crate::symbol::SymbolId;

pub trait ProgramContext: Send + Sync {
    /// The primary symbol at `address`, if one has been designated.
    fn primary_at(&self, address: Address) -> Option<SymbolId>;

    /// Make `symbol` the primary symbol at `address` (`None` clears it).
    fn set_primary(&self, address: Address, symbol: Option<SymbolId>);

    fn is_external_entry_point(&self, address: Address) -> bool;

    /// Register names that alias `address`.
    fn register_names_at(&self, address: Address) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct MemProgramContext {
    primaries: DashMap<Address, SymbolId>,
    entry_points: DashSet<Address>,
    registers: DashMap<Address, Vec<String>>,
}

impl MemProgramContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry_point(&self, address: Address) {
        self.entry_points.insert(address);
    }

    pub fn add_register(&self, address: Address, name: impl Into<String>) {
        self.registers.entry(address).or_default().push(name.into());
    }
}

impl ProgramContext for MemProgramContext {
    fn primary_at(&self, address: Address) -> Option<SymbolId> {
        self.primaries.get(&address).map(|id| *id.value())
    }

    fn set_primary(&self, address: Address, symbol: Option<SymbolId>) {
        match symbol {
            Some(id) => {
                self.primaries.insert(address, id);
            }
            None => {
                self.primaries.remove(&address);
            }
        }
    }

    fn is_external_entry_point(&self, address: Address) -> bool {
        self.entry_points.contains(&address)
    }

    fn register_names_at(&self, address: Address) -> Vec<String> {
        self.registers
            .get(&address)
            .map(|names| names.value().clone())
            .unwrap_or_default()
    }
}
