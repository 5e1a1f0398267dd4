//! Persisted symbol row.
//!
//! One [`SymbolRecord`] exists per non-dynamic symbol. The flags byte packs the
//! source ordinal into its low two bits and the pinned flag into bit 2; the
//! remaining bits are reserved and preserved across writes.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::StoreError;
use crate::symbol::{Namespace, SourceType, SymbolId, SymbolType};

/// Mask of the source-type ordinal inside [`SymbolRecord::flags`].
pub const SOURCE_BITS: u8 = 0b0000_0011;
/// Pinned (anchored) flag inside [`SymbolRecord::flags`].
pub const PINNED_FLAG: u8 = 0b0000_0100;

/// One row of the symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub id: SymbolId,
    /// Raw type tag, see [`SymbolType::tag`].
    pub type_tag: u8,
    pub address: Address,
    /// Empty when the source is [`SourceType::Default`].
    pub name: String,
    pub parent: Namespace,
    pub flags: u8,
    pub data1: i64,
    pub data2: i32,
    pub data3: Option<String>,
}

impl SymbolRecord {
    pub fn new(
        id: SymbolId,
        symbol_type: SymbolType,
        address: Address,
        name: impl Into<String>,
        parent: Namespace,
        source: SourceType,
    ) -> Self {
        Self {
            id,
            type_tag: symbol_type.tag(),
            address,
            name: name.into(),
            parent,
            flags: source.ordinal(),
            data1: 0,
            data2: 0,
            data3: None,
        }
    }

    /// Decoded symbol type, `None` for a tag this build does not know.
    pub fn symbol_type(&self) -> Option<SymbolType> {
        SymbolType::from_tag(self.type_tag)
    }

    pub fn source(&self) -> SourceType {
        SourceType::from_ordinal(self.flags & SOURCE_BITS)
    }

    /// Replace the source bits, leaving every other flag untouched.
    pub fn set_source(&mut self, source: SourceType) {
        self.flags = (self.flags & !SOURCE_BITS) | source.ordinal();
    }

    pub fn is_pinned(&self) -> bool {
        self.flags & PINNED_FLAG != 0
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        if pinned {
            self.flags |= PINNED_FLAG;
        } else {
            self.flags &= !PINNED_FLAG;
        }
    }

    /// Serialize for the durable tier.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization {
            message: format!("failed to serialize symbol record {}: {e}", self.id),
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization {
            message: format!("failed to deserialize symbol record: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SymbolRecord {
        SymbolRecord::new(
            SymbolId::new(7).unwrap(),
            SymbolType::Function,
            Address::ram(0x401000),
            "main",
            Namespace::Global,
            SourceType::Imported,
        )
    }

    #[test]
    fn source_bits_leave_other_flags_alone() {
        let mut rec = record();
        rec.flags |= 0b1000_0000;
        rec.set_pinned(true);
        rec.set_source(SourceType::UserDefined);
        assert_eq!(rec.source(), SourceType::UserDefined);
        assert!(rec.is_pinned());
        assert_eq!(rec.flags & 0b1000_0000, 0b1000_0000);

        rec.set_pinned(false);
        assert!(!rec.is_pinned());
        assert_eq!(rec.source(), SourceType::UserDefined);
    }

    #[test]
    fn encoded_record_decodes_identically() {
        let mut rec = record();
        rec.data3 = Some("thunk".into());
        let bytes = rec.encode().unwrap();
        assert_eq!(SymbolRecord::decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn unknown_type_tag_decodes_to_none() {
        let mut rec = record();
        rec.type_tag = 2;
        assert_eq!(rec.symbol_type(), None);
    }
}
