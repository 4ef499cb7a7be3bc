//! # Instruction Encoding Constants and Helpers
//!
//! This module provides the bit positions, masks and the generic packer for
//! the 128-bit accelerator instruction word.
//!
//! ## Instruction Format (128-bit, most significant field first)
//!
//! ```text
//! [modules:17][reserved:56][addr_same:1][add_sub:1][decompress_output2:3]
//! [element_count:4][mul_const_sel:1][mode:1][address2:13][address1:13]
//! [bank6:3][bank5:3][bank4:3][bank3:3][bank2:3][bank1:3]
//! ```

use crate::bank::BankSlot;
use crate::error::{Result, SpecError};

/// Width of one instruction word
pub const INSTRUCTION_BITS: u32 = 128;

/// Bytes per instruction word
pub const INSTRUCTION_BYTES: usize = 16;

// ============================================================================
// Bit Position Constants
// ============================================================================

/// Module-enable mask: bits 111-127 (17 bits)
pub const MODULES_SHIFT: u32 = 111;

/// Zero padding: bits 55-110 (56 bits)
pub const RESERVED_SHIFT: u32 = 55;

/// Output written at the input address: bit 54
pub const ADDR_SAME_SHIFT: u32 = 54;

/// Add (0) or subtract (1); sampler tree-row half: bit 53
pub const ADD_SUB_SHIFT: u32 = 53;

/// Second DECOMPRESS output bank: bits 50-52 (3 bits)
pub const DECOMPRESS_OUTPUT2_SHIFT: u32 = 50;

/// log2 of the rows processed: bits 46-49 (4 bits)
pub const ELEMENT_COUNT_SHIFT: u32 = 46;

/// MUL_CONST constant selection: bit 45
pub const MUL_CONST_SEL_SHIFT: u32 = 45;

/// Transform direction / sampler reseed: bit 44
pub const MODE_SHIFT: u32 = 44;

/// Second row address: bits 31-43 (13 bits)
pub const ADDRESS2_SHIFT: u32 = 31;

/// First row address: bits 18-30 (13 bits)
pub const ADDRESS1_SHIFT: u32 = 18;

/// Lowest bank slot (bank1): bits 0-2; slot `k` sits at `3 * k`
pub const BANK_SHIFT: u32 = 0;

// ============================================================================
// Field Widths and Masks
// ============================================================================

pub const MODULES_WIDTH: u32 = 17;
pub const RESERVED_WIDTH: u32 = 56;
pub const FLAG_WIDTH: u32 = 1;
pub const DECOMPRESS_OUTPUT2_WIDTH: u32 = 3;
pub const ELEMENT_COUNT_WIDTH: u32 = 4;
pub const ADDRESS_WIDTH: u32 = 13;
pub const BANK_WIDTH: u32 = 3;

/// Module mask (17 bits)
pub const MODULES_MASK: u128 = 0x1_FFFF;

/// Reserved padding (56 bits)
pub const RESERVED_MASK: u128 = (1 << RESERVED_WIDTH) - 1;

/// Single-bit flag
pub const FLAG_MASK: u128 = 0x1;

/// Bank index (3 bits)
pub const BANK_MASK: u128 = 0x7;

/// Row address (13 bits)
pub const ADDRESS_MASK: u128 = 0x1FFF;

/// Element count (4 bits)
pub const ELEMENT_COUNT_MASK: u128 = 0xF;

/// Rows addressable in one bank
pub const BANK_ROWS: u32 = 1 << ADDRESS_WIDTH;

// ============================================================================
// Field Layout
// ============================================================================

/// Named field of the instruction word
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Modules,
    Reserved,
    AddrSame,
    AddSub,
    DecompressOutput2,
    ElementCount,
    MulConstSel,
    Mode,
    Address2,
    Address1,
    Bank(BankSlot),
}

impl Field {
    pub const fn name(self) -> &'static str {
        match self {
            Field::Modules => "modules",
            Field::Reserved => "reserved",
            Field::AddrSame => "addr_same",
            Field::AddSub => "add_sub",
            Field::DecompressOutput2 => "decompress_output2",
            Field::ElementCount => "element_count",
            Field::MulConstSel => "mul_const_sel",
            Field::Mode => "mode",
            Field::Address2 => "address2",
            Field::Address1 => "address1",
            Field::Bank(slot) => slot.name(),
        }
    }

    pub const fn width(self) -> u32 {
        match self {
            Field::Modules => MODULES_WIDTH,
            Field::Reserved => RESERVED_WIDTH,
            Field::AddrSame | Field::AddSub | Field::MulConstSel | Field::Mode => FLAG_WIDTH,
            Field::DecompressOutput2 => DECOMPRESS_OUTPUT2_WIDTH,
            Field::ElementCount => ELEMENT_COUNT_WIDTH,
            Field::Address2 | Field::Address1 => ADDRESS_WIDTH,
            Field::Bank(_) => BANK_WIDTH,
        }
    }

    pub const fn shift(self) -> u32 {
        match self {
            Field::Modules => MODULES_SHIFT,
            Field::Reserved => RESERVED_SHIFT,
            Field::AddrSame => ADDR_SAME_SHIFT,
            Field::AddSub => ADD_SUB_SHIFT,
            Field::DecompressOutput2 => DECOMPRESS_OUTPUT2_SHIFT,
            Field::ElementCount => ELEMENT_COUNT_SHIFT,
            Field::MulConstSel => MUL_CONST_SEL_SHIFT,
            Field::Mode => MODE_SHIFT,
            Field::Address2 => ADDRESS2_SHIFT,
            Field::Address1 => ADDRESS1_SHIFT,
            Field::Bank(slot) => bank_shift(slot),
        }
    }

    /// Mask of the field's value (not shifted into place)
    #[inline]
    pub const fn mask(self) -> u128 {
        (1u128 << self.width()) - 1
    }

    /// Check that `value` fits this field
    pub fn check(self, value: u128) -> Result<u128> {
        if value & !self.mask() != 0 {
            return Err(SpecError::overflow(self.name(), value, self.width()));
        }
        Ok(value)
    }

    /// Read this field out of a word
    #[inline]
    pub const fn extract(self, word: u128) -> u128 {
        (word >> self.shift()) & self.mask()
    }
}

/// The definitive layout, most significant field first
pub const LAYOUT: [Field; 16] = [
    Field::Modules,
    Field::Reserved,
    Field::AddrSame,
    Field::AddSub,
    Field::DecompressOutput2,
    Field::ElementCount,
    Field::MulConstSel,
    Field::Mode,
    Field::Address2,
    Field::Address1,
    Field::Bank(BankSlot::Bank6),
    Field::Bank(BankSlot::Bank5),
    Field::Bank(BankSlot::Bank4),
    Field::Bank(BankSlot::Bank3),
    Field::Bank(BankSlot::Bank2),
    Field::Bank(BankSlot::Bank1),
];

/// A named value of a given width, one entry of a packing list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldValue {
    pub name: &'static str,
    pub width: u32,
    pub value: u128,
}

impl FieldValue {
    pub const fn new(name: &'static str, width: u32, value: u128) -> Self {
        Self { name, width, value }
    }

    /// Entry for a field of the definitive layout
    pub const fn of(field: Field, value: u128) -> Self {
        Self::new(field.name(), field.width(), value)
    }
}

/// Concatenate fields most significant first into one 128-bit word
///
/// The widths must add up to exactly 128 and every value must fit its width.
pub fn pack(fields: &[FieldValue]) -> Result<u128> {
    let total: u32 = fields.iter().map(|f| f.width).sum();
    if total != INSTRUCTION_BITS {
        return Err(SpecError::LayoutWidth {
            expected: INSTRUCTION_BITS,
            found: total,
        });
    }

    let mut word = 0u128;
    for field in fields {
        if field.width == 0 {
            continue;
        }
        if field.width < INSTRUCTION_BITS && field.value >> field.width != 0 {
            return Err(SpecError::overflow(field.name, field.value, field.width));
        }
        word = if field.width == INSTRUCTION_BITS {
            field.value
        } else {
            (word << field.width) | field.value
        };
    }
    Ok(word)
}

// ============================================================================
// Field Extraction Functions
// ============================================================================

/// Bit position of a bank slot
#[inline]
pub const fn bank_shift(slot: BankSlot) -> u32 {
    BANK_SHIFT + BANK_WIDTH * slot.index() as u32
}

/// Extract the module mask (bits 111-127)
#[inline]
pub const fn extract_modules(word: u128) -> u32 {
    ((word >> MODULES_SHIFT) & MODULES_MASK) as u32
}

/// Extract the reserved padding (bits 55-110)
#[inline]
pub const fn extract_reserved(word: u128) -> u128 {
    (word >> RESERVED_SHIFT) & RESERVED_MASK
}

/// Extract the `addr_same` flag (bit 54)
#[inline]
pub const fn extract_addr_same(word: u128) -> bool {
    (word >> ADDR_SAME_SHIFT) & FLAG_MASK != 0
}

/// Extract the `add_sub` flag (bit 53)
#[inline]
pub const fn extract_add_sub(word: u128) -> bool {
    (word >> ADD_SUB_SHIFT) & FLAG_MASK != 0
}

/// Extract the second DECOMPRESS output bank index (bits 50-52)
#[inline]
pub const fn extract_decompress_output2(word: u128) -> u8 {
    ((word >> DECOMPRESS_OUTPUT2_SHIFT) & BANK_MASK) as u8
}

/// Extract the element count (bits 46-49)
#[inline]
pub const fn extract_element_count(word: u128) -> u8 {
    ((word >> ELEMENT_COUNT_SHIFT) & ELEMENT_COUNT_MASK) as u8
}

/// Extract the MUL_CONST selection bit (bit 45)
#[inline]
pub const fn extract_mul_const_sel(word: u128) -> bool {
    (word >> MUL_CONST_SEL_SHIFT) & FLAG_MASK != 0
}

/// Extract the mode bit (bit 44)
#[inline]
pub const fn extract_mode(word: u128) -> bool {
    (word >> MODE_SHIFT) & FLAG_MASK != 0
}

/// Extract the second address (bits 31-43)
#[inline]
pub const fn extract_address2(word: u128) -> u16 {
    ((word >> ADDRESS2_SHIFT) & ADDRESS_MASK) as u16
}

/// Extract the first address (bits 18-30)
#[inline]
pub const fn extract_address1(word: u128) -> u16 {
    ((word >> ADDRESS1_SHIFT) & ADDRESS_MASK) as u16
}

/// Extract a bank slot's raw index
#[inline]
pub const fn extract_bank(word: u128, slot: BankSlot) -> u8 {
    ((word >> bank_shift(slot)) & BANK_MASK) as u8
}
