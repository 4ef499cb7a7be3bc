//! Accelerator Instruction Word
//!
//! A typed view of one 128-bit instruction. Builder setters validate each
//! value against its field width, so an `Instruction` obtained through them
//! always encodes.

use crate::bank::{Bank, BankSlot};
use crate::encoding::{self, Field, FieldValue, LAYOUT};
use crate::error::{Result, SpecError};
use crate::unit::{ModuleMask, Unit};
use serde::{Deserialize, Serialize};

/// One accelerator instruction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    /// Active functional units
    pub modules: ModuleMask,
    /// Raw bank indices of slots bank1..bank6
    pub banks: [u8; 6],
    pub address1: u16,
    pub address2: u16,
    /// Inverse transform (FFT/NTT) or fresh sampler state (SAMPLERZ)
    pub mode: bool,
    pub mul_const_sel: bool,
    /// log2 of the rows processed by vector units
    pub element_count: u8,
    /// Second DECOMPRESS output bank
    pub decompress_output2: u8,
    /// Subtract for ADD_SUB; tree-row half for SAMPLERZ
    pub add_sub: bool,
    /// ADD_SUB writes at `address1` instead of `address2`
    pub addr_same: bool,
}

impl Instruction {
    /// Empty instruction activating the given units
    pub fn new(modules: ModuleMask) -> Self {
        Self {
            modules,
            ..Self::default()
        }
    }

    /// Empty instruction activating one unit
    pub fn unit(unit: Unit) -> Self {
        Self::new(ModuleMask::from(unit))
    }

    /// Co-issue one more unit
    pub fn also(mut self, unit: Unit) -> Self {
        self.modules = self.modules.with(unit);
        self
    }

    pub fn with_bank(mut self, slot: BankSlot, bank: Bank) -> Self {
        self.banks[slot.index()] = bank.as_u8();
        self
    }

    pub fn with_address1(mut self, address: u32) -> Result<Self> {
        self.address1 = Field::Address1.check(address as u128)? as u16;
        Ok(self)
    }

    pub fn with_address2(mut self, address: u32) -> Result<Self> {
        self.address2 = Field::Address2.check(address as u128)? as u16;
        Ok(self)
    }

    pub fn with_element_count(mut self, count: u32) -> Result<Self> {
        self.element_count = Field::ElementCount.check(count as u128)? as u8;
        Ok(self)
    }

    pub fn with_mode(mut self, mode: bool) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_mul_const_sel(mut self, sel: bool) -> Self {
        self.mul_const_sel = sel;
        self
    }

    pub fn with_decompress_output2(mut self, bank: Bank) -> Self {
        self.decompress_output2 = bank.as_u8();
        self
    }

    pub fn with_add_sub(mut self, subtract: bool) -> Self {
        self.add_sub = subtract;
        self
    }

    pub fn with_addr_same(mut self, same: bool) -> Self {
        self.addr_same = same;
        self
    }

    /// Bank held by a slot
    pub fn bank(&self, slot: BankSlot) -> Result<Bank> {
        Bank::from_index(self.banks[slot.index()])
    }

    /// Bank of the second DECOMPRESS output
    pub fn decompress_output2_bank(&self) -> Result<Bank> {
        Bank::from_index(self.decompress_output2)
    }

    /// Rows processed by vector units
    #[inline]
    pub fn rows(&self) -> u32 {
        1 << self.element_count
    }

    /// Whether a unit is active
    #[inline]
    pub fn uses(&self, unit: Unit) -> bool {
        self.modules.contains(unit)
    }

    fn field_value(&self, field: Field) -> u128 {
        match field {
            Field::Modules => self.modules.bits() as u128,
            Field::Reserved => 0,
            Field::AddrSame => self.addr_same as u128,
            Field::AddSub => self.add_sub as u128,
            Field::DecompressOutput2 => self.decompress_output2 as u128,
            Field::ElementCount => self.element_count as u128,
            Field::MulConstSel => self.mul_const_sel as u128,
            Field::Mode => self.mode as u128,
            Field::Address2 => self.address2 as u128,
            Field::Address1 => self.address1 as u128,
            Field::Bank(slot) => self.banks[slot.index()] as u128,
        }
    }

    /// Encode to the 128-bit hardware word
    pub fn encode(&self) -> Result<u128> {
        let fields: Vec<FieldValue> = LAYOUT
            .iter()
            .map(|&field| FieldValue::of(field, self.field_value(field)))
            .collect();
        encoding::pack(&fields)
    }

    /// Decode a 128-bit hardware word
    ///
    /// Rejects nonzero reserved bits and bank index 7 in any slot an active
    /// unit uses.
    pub fn decode(word: u128) -> Result<Self> {
        let reserved = encoding::extract_reserved(word);
        if reserved != 0 {
            return Err(SpecError::ReservedBitsSet(reserved << encoding::RESERVED_SHIFT));
        }

        let modules = ModuleMask::from_bits(encoding::extract_modules(word))?;
        let mut banks = [0u8; 6];
        for slot in BankSlot::ALL {
            banks[slot.index()] = encoding::extract_bank(word, slot);
        }

        let inst = Self {
            modules,
            banks,
            address1: encoding::extract_address1(word),
            address2: encoding::extract_address2(word),
            mode: encoding::extract_mode(word),
            mul_const_sel: encoding::extract_mul_const_sel(word),
            element_count: encoding::extract_element_count(word),
            decompress_output2: encoding::extract_decompress_output2(word),
            add_sub: encoding::extract_add_sub(word),
            addr_same: encoding::extract_addr_same(word),
        };

        for unit in modules.units() {
            for &slot in unit.bank_slots() {
                inst.bank(slot)?;
            }
        }
        if inst.uses(Unit::Decompress) {
            inst.decompress_output2_bank()?;
        }

        Ok(inst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_banks_and_mode() {
        let inst = Instruction::unit(Unit::NttIntt)
            .with_bank(BankSlot::Bank1, Bank::Bram5)
            .with_bank(BankSlot::Bank2, Bank::Bram2)
            .with_mode(true);
        let word = inst.encode().unwrap();

        assert_eq!(word & 0x7, 5);
        assert_eq!((word >> 3) & 0x7, 2);
        assert_eq!((word >> 44) & 0x1, 1);
        assert_eq!(word >> 111, 1 << 10);
    }

    #[test]
    fn test_address_overflow() {
        let err = Instruction::unit(Unit::Copy)
            .with_address1(8192)
            .unwrap_err();
        assert_eq!(err, SpecError::overflow("address1", 8192, 13));

        assert!(Instruction::unit(Unit::Copy).with_address2(8191).is_ok());
        assert!(Instruction::unit(Unit::Copy).with_element_count(16).is_err());
    }

    #[test]
    fn test_encode_rejects_raw_overflow() {
        let mut inst = Instruction::unit(Unit::Copy);
        inst.banks[0] = 9;
        assert_eq!(inst.encode(), Err(SpecError::overflow("bank1", 9, 3)));
    }

    #[test]
    fn test_decode_roundtrip() {
        let inst = Instruction::unit(Unit::AddSub)
            .also(Unit::FftIfft)
            .with_bank(BankSlot::Bank1, Bank::Bram1)
            .with_bank(BankSlot::Bank2, Bank::Bram0)
            .with_bank(BankSlot::Bank3, Bank::Bram1)
            .with_address1(0x300)
            .unwrap()
            .with_address2(0x1FFF)
            .unwrap()
            .with_element_count(7)
            .unwrap()
            .with_add_sub(true)
            .with_addr_same(true);

        let decoded = Instruction::decode(inst.encode().unwrap()).unwrap();
        assert_eq!(decoded, inst);
        assert_eq!(decoded.rows(), 128);
    }

    #[test]
    fn test_decode_reserved_bits() {
        let word = 1u128 << 60;
        assert_eq!(
            Instruction::decode(word),
            Err(SpecError::ReservedBitsSet(1 << 60))
        );
    }

    #[test]
    fn test_decode_bank_seven() {
        // Bank 7 in an unused slot is tolerated
        let word = (1u128 << Unit::Copy.bit() << 111) | 0x7;
        assert!(Instruction::decode(word).is_ok());

        // ...but not in a slot COPY reads from
        let word = (1u128 << Unit::Copy.bit() << 111) | (0x7 << 6);
        assert_eq!(Instruction::decode(word), Err(SpecError::InvalidBank(7)));
    }
}
