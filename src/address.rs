//! Program addresses: an offset inside a fixed-width address space.
//!
//! Symbols are bound to an [`Address`]. Namespace-like symbols have no location
//! and use [`Address::NO_ADDRESS`]. Offsets wrap modulo the space size, which is
//! what memory-block moves rely on.

use serde::{Deserialize, Serialize};

/// An address space: a numeric id plus the width of its offsets in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressSpace {
    id: u16,
    bits: u8,
}

impl AddressSpace {
    /// Sentinel space of [`Address::NO_ADDRESS`].
    pub const NONE: AddressSpace = AddressSpace { id: 0, bits: 0 };
    /// Default 32-bit memory space.
    pub const RAM: AddressSpace = AddressSpace { id: 1, bits: 32 };
    /// Processor register space.
    pub const REGISTER: AddressSpace = AddressSpace { id: 2, bits: 16 };
    /// Function-relative stack space used by variables.
    pub const STACK: AddressSpace = AddressSpace { id: 3, bits: 32 };

    /// Create a space with the given id and offset width (clamped to 1..=64 bits).
    pub const fn new(id: u16, bits: u8) -> Self {
        let bits = if bits == 0 {
            1
        } else if bits > 64 {
            64
        } else {
            bits
        };
        Self { id, bits }
    }

    pub fn id(self) -> u16 {
        self.id
    }

    pub fn bits(self) -> u8 {
        self.bits
    }

    /// Mask selecting the valid offset bits of this space.
    pub fn mask(self) -> u64 {
        match self.bits {
            0 => 0,
            b if b >= 64 => u64::MAX,
            b => (1u64 << b) - 1,
        }
    }

    /// Whether addresses in this space refer to loaded memory.
    pub fn is_memory(self) -> bool {
        self.id != AddressSpace::NONE.id
            && self.id != AddressSpace::REGISTER.id
            && self.id != AddressSpace::STACK.id
    }

    /// Short printable name of the space.
    pub fn name(self) -> String {
        match self.id {
            0 => "none".into(),
            1 => "ram".into(),
            2 => "register".into(),
            3 => "stack".into(),
            n => format!("space{n}"),
        }
    }
}

/// A location inside an [`AddressSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    space: AddressSpace,
    offset: u64,
}

impl Address {
    /// Location of symbols that are not bound to memory (namespaces, classes, libraries).
    pub const NO_ADDRESS: Address = Address {
        space: AddressSpace::NONE,
        offset: 0,
    };

    /// Create an address; the offset is truncated to the space width.
    pub fn new(space: AddressSpace, offset: u64) -> Self {
        Self {
            space,
            offset: offset & space.mask(),
        }
    }

    /// Shorthand for an address in [`AddressSpace::RAM`].
    pub fn ram(offset: u64) -> Self {
        Self::new(AddressSpace::RAM, offset)
    }

    pub fn space(self) -> AddressSpace {
        self.space
    }

    pub fn offset(self) -> u64 {
        self.offset
    }

    pub fn is_memory(self) -> bool {
        self.space.is_memory()
    }

    /// Signed distance `self - base`. Both addresses must share a space.
    pub fn subtract(self, base: Address) -> Option<i64> {
        if self.space != base.space {
            return None;
        }
        Some(self.offset.wrapping_sub(base.offset) as i64)
    }

    /// Add a signed displacement, wrapping around the end of the space.
    pub fn add_wrap(self, displacement: i64) -> Address {
        Address {
            space: self.space,
            offset: self.offset.wrapping_add(displacement as u64) & self.space.mask(),
        }
    }

    /// Offset rendered as zero-padded hex, as used in default symbol names.
    pub fn hex_offset(self) -> String {
        let width = (usize::from(self.space.bits) + 3) / 4;
        format!("{:0width$x}", self.offset, width = width.max(1))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Address::NO_ADDRESS {
            return write!(f, "NO ADDRESS");
        }
        write!(f, "{}:{}", self.space.name(), self.hex_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_masked_to_space_width() {
        let a = Address::new(AddressSpace::new(7, 8), 0x1ff);
        assert_eq!(a.offset(), 0xff);
    }

    #[test]
    fn add_wrap_wraps_at_end_of_space() {
        let a = Address::ram(0xffff_fff0);
        assert_eq!(a.add_wrap(0x20).offset(), 0x10);
        assert_eq!(Address::ram(0x10).add_wrap(-0x20).offset(), 0xffff_fff0);
    }

    #[test]
    fn subtract_requires_same_space() {
        let a = Address::ram(0x1010);
        assert_eq!(a.subtract(Address::ram(0x1000)), Some(0x10));
        assert_eq!(a.subtract(Address::new(AddressSpace::STACK, 0)), None);
    }

    #[test]
    fn display_pads_to_space_width() {
        assert_eq!(Address::ram(0x401000).to_string(), "ram:00401000");
        assert_eq!(Address::NO_ADDRESS.to_string(), "NO ADDRESS");
    }

    #[test]
    fn memory_spaces() {
        assert!(Address::ram(0).is_memory());
        assert!(!Address::new(AddressSpace::STACK, 4).is_memory());
        assert!(!Address::NO_ADDRESS.is_memory());
    }
}
