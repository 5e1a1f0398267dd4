//! References into the program and the index that answers "who points here".
//!
//! Each [`Reference`] records the symbol it is attached to through [`RefOwner`].
//! `RefOwner::Primary` is the sentinel meaning "whichever symbol is primary at
//! the destination", so anonymous references follow the primary symbol when it
//! changes.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::symbol::SymbolId;

/// Symbol a reference is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefOwner {
    /// Attached to the primary symbol of the destination address.
    Primary,
    Symbol(SymbolId),
}

/// Flow or data kind of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefKind {
    Call,
    Jump,
    Read,
    Write,
    Data,
}

/// A single `from → to` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub from: Address,
    pub to: Address,
    pub kind: RefKind,
    pub owner: RefOwner,
}

impl Reference {
    pub fn new(from: Address, to: Address, kind: RefKind) -> Self {
        Self {
            from,
            to,
            kind,
            owner: RefOwner::Primary,
        }
    }

    /// Attach the reference to a specific symbol instead of the primary one.
    pub fn owned_by(mut self, owner: SymbolId) -> Self {
        self.owner = RefOwner::Symbol(owner);
        self
    }
}

/// Address → references lookup.
pub trait ReferenceIndex: Send + Sync {
    /// References whose destination is `to`.
    fn references_to(&self, to: Address) -> Box<dyn Iterator<Item = Reference> + Send + '_>;

    /// Number of references whose destination is `to`.
    fn reference_count_to(&self, to: Address) -> usize;

    /// Reattach every reference to `to` owned by `from` to `owner`.
    /// Returns how many references changed.
    fn retarget(&self, to: Address, from: SymbolId, owner: RefOwner) -> usize;
}

/// In-memory reference index keyed by destination address.
#[derive(Debug, Default)]
pub struct MemReferenceIndex {
    by_target: DashMap<Address, Vec<Reference>>,
}

impl MemReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, reference: Reference) {
        self.by_target.entry(reference.to).or_default().push(reference);
    }

    /// Remove every reference from `from` to `to`. Returns how many were removed.
    pub fn remove(&self, from: Address, to: Address) -> usize {
        let Some(mut refs) = self.by_target.get_mut(&to) else {
            return 0;
        };
        let before = refs.len();
        refs.retain(|r| r.from != from);
        before - refs.len()
    }
}

impl ReferenceIndex for MemReferenceIndex {
    fn references_to(&self, to: Address) -> Box<dyn Iterator<Item = Reference> + Send + '_> {
        let snapshot = self
            .by_target
            .get(&to)
            .map(|refs| refs.value().clone())
            .unwrap_or_default();
        Box::new(snapshot.into_iter())
    }

    fn reference_count_to(&self, to: Address) -> usize {
        self.by_target.get(&to).map_or(0, |refs| refs.len())
    }

    fn retarget(&self, to: Address, from: SymbolId, owner: RefOwner) -> usize {
        let Some(mut refs) = self.by_target.get_mut(&to) else {
            return 0;
        };
        let mut changed = 0;
        for r in refs.iter_mut().filter(|r| r.owner == RefOwner::Symbol(from)) {
            r.owner = owner;
            changed += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_count_and_iterate() {
        let index = MemReferenceIndex::new();
        let to = Address::ram(0x400);
        index.add(Reference::new(Address::ram(0x10), to, RefKind::Call));
        index.add(Reference::new(Address::ram(0x20), to, RefKind::Jump));
        assert_eq!(index.reference_count_to(to), 2);
        assert_eq!(index.references_to(to).count(), 2);
        assert_eq!(index.reference_count_to(Address::ram(0x500)), 0);
    }

    #[test]
    fn retarget_only_touches_matching_owner() {
        let index = MemReferenceIndex::new();
        let to = Address::ram(0x400);
        let s = SymbolId::new(5).unwrap();
        index.add(Reference::new(Address::ram(0x10), to, RefKind::Read).owned_by(s));
        index.add(Reference::new(Address::ram(0x20), to, RefKind::Read));
        assert_eq!(index.retarget(to, s, RefOwner::Primary), 1);
        assert!(index.references_to(to).all(|r| r.owner == RefOwner::Primary));
    }

    #[test]
    fn remove_by_source() {
        let index = MemReferenceIndex::new();
        let to = Address::ram(0x400);
        index.add(Reference::new(Address::ram(0x10), to, RefKind::Data));
        assert_eq!(index.remove(Address::ram(0x10), to), 1);
        assert_eq!(index.reference_count_to(to), 0);
    }
}
