//! # Functional Units and the Module-Enable Mask
//!
//! The datapath exposes 17 functional units. An instruction activates units by
//! setting their bits in the 17-bit `modules` field; several bits may be set
//! when units co-issue.
//!
//! ## Bit Assignment
//!
//! The table is append-only: a newly added unit takes bit 0 and every earlier
//! unit shifts up by one. `Unit::ALL` is the single ordered list both the
//! encoder and the decoder derive bits from.
//!
//! ```text
//! 16 BRAM_READ      11 FFT_IFFT      6 MERGE        1 ADD_SUB
//! 15 BRAM_WRITE     10 NTT_INTT      5 MOD_MULT_Q   0 SAMPLERZ
//! 14 COPY            9 COMPLEX_MUL   4 SUB_NORM_SQ
//! 13 HASH_TO_POINT   8 MUL_CONST     3 DECOMPRESS
//! 12 INT_TO_DOUBLE   7 SPLIT         2 COMPRESS
//! ```

use crate::bank::BankSlot;
use crate::error::{Result, SpecError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of functional units, and the width of the module mask
pub const NUM_UNITS: u32 = 17;

/// Functional unit, numbered in append order
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Host-side bank read
    BramRead = 0,
    /// Host-side bank write
    BramWrite = 1,
    /// Row-wise bank to bank copy
    Copy = 2,
    /// SHAKE-based hash of the message header onto a ring element
    HashToPoint = 3,
    /// Integer coefficients to floating point
    IntToDouble = 4,
    /// Complex FFT, or IFFT with `mode = 1`
    FftIfft = 5,
    /// NTT modulo q, or INTT with `mode = 1`
    NttIntt = 6,
    /// Pointwise complex multiply
    ComplexMul = 7,
    /// Multiply by one of two constants, picked by `mul_const_sel`
    MulConst = 8,
    /// FFT-domain split into even/odd halves
    Split = 9,
    /// FFT-domain merge, inverse of split
    Merge = 10,
    /// Pointwise multiply modulo q
    ModMultQ = 11,
    /// Subtract and accumulate the squared norm
    SubNormSq = 12,
    /// Signature decompression
    Decompress = 13,
    /// Signature compression
    Compress = 14,
    /// Pointwise add, or subtract with `add_sub = 1`
    AddSub = 15,
    /// Discrete Gaussian sampler over the integers
    SamplerZ = 16,
}

impl Unit {
    /// Every unit in table order (highest mask bit first)
    pub const ALL: [Unit; NUM_UNITS as usize] = [
        Unit::BramRead,
        Unit::BramWrite,
        Unit::Copy,
        Unit::HashToPoint,
        Unit::IntToDouble,
        Unit::FftIfft,
        Unit::NttIntt,
        Unit::ComplexMul,
        Unit::MulConst,
        Unit::Split,
        Unit::Merge,
        Unit::ModMultQ,
        Unit::SubNormSq,
        Unit::Decompress,
        Unit::Compress,
        Unit::AddSub,
        Unit::SamplerZ,
    ];

    /// Bit position of this unit in the module mask
    #[inline]
    pub const fn bit(self) -> u32 {
        NUM_UNITS - 1 - self as u32
    }

    /// Unit owning a mask bit
    pub fn from_bit(bit: u32) -> Option<Self> {
        if bit >= NUM_UNITS {
            return None;
        }
        Some(Self::ALL[(NUM_UNITS - 1 - bit) as usize])
    }

    /// Canonical upper-case name
    pub const fn name(self) -> &'static str {
        match self {
            Unit::BramRead => "BRAM_READ",
            Unit::BramWrite => "BRAM_WRITE",
            Unit::Copy => "COPY",
            Unit::HashToPoint => "HASH_TO_POINT",
            Unit::IntToDouble => "INT_TO_DOUBLE",
            Unit::FftIfft => "FFT_IFFT",
            Unit::NttIntt => "NTT_INTT",
            Unit::ComplexMul => "COMPLEX_MUL",
            Unit::MulConst => "MUL_CONST",
            Unit::Split => "SPLIT",
            Unit::Merge => "MERGE",
            Unit::ModMultQ => "MOD_MULT_Q",
            Unit::SubNormSq => "SUB_NORM_SQ",
            Unit::Decompress => "DECOMPRESS",
            Unit::Compress => "COMPRESS",
            Unit::AddSub => "ADD_SUB",
            Unit::SamplerZ => "SAMPLERZ",
        }
    }

    /// Look up a unit by name, ignoring case
    ///
    /// Cycle logs name two units differently; `MULT_MOD_Q` and `CHECK_BOUND`
    /// are accepted for `MOD_MULT_Q` and `SUB_NORM_SQ`.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "MULT_MOD_Q" => return Some(Unit::ModMultQ),
            "CHECK_BOUND" => return Some(Unit::SubNormSq),
            _ => {}
        }
        Self::ALL.iter().copied().find(|u| u.name() == upper)
    }

    /// Units that process `2^element_count` rows per instruction
    #[inline]
    pub const fn is_vector(self) -> bool {
        matches!(
            self,
            Unit::Copy
                | Unit::IntToDouble
                | Unit::ComplexMul
                | Unit::MulConst
                | Unit::Split
                | Unit::Merge
                | Unit::ModMultQ
                | Unit::SubNormSq
                | Unit::AddSub
        )
    }

    /// Bank slots this unit reads or writes through
    pub const fn bank_slots(self) -> &'static [BankSlot] {
        use BankSlot::*;
        match self {
            Unit::BramRead | Unit::BramWrite => &[],
            Unit::Copy | Unit::HashToPoint | Unit::MulConst => &[Bank3, Bank4],
            Unit::IntToDouble
            | Unit::FftIfft
            | Unit::NttIntt
            | Unit::ComplexMul
            | Unit::Split
            | Unit::Merge
            | Unit::Compress => &[Bank1, Bank2],
            Unit::ModMultQ | Unit::SubNormSq | Unit::AddSub | Unit::SamplerZ => {
                &[Bank1, Bank2, Bank3]
            }
            Unit::Decompress => &[Bank5, Bank6],
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 17-bit module-enable mask
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleMask(u32);

impl ModuleMask {
    /// No unit active
    pub const EMPTY: Self = Self(0);

    /// Mask value bits
    pub const BITS_MASK: u32 = (1 << NUM_UNITS) - 1;

    /// Build a mask from raw bits, rejecting bits above the table
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits & !Self::BITS_MASK != 0 {
            return Err(SpecError::overflow("modules", bits as u128, NUM_UNITS));
        }
        Ok(Self(bits))
    }

    /// Select units by name; unlisted units stay inactive
    ///
    /// ```
    /// use falconhw_spec::{ModuleMask, Unit};
    ///
    /// let mask = ModuleMask::select(["copy", "COMPLEX_MUL"]).unwrap();
    /// assert!(mask.contains(Unit::Copy));
    /// assert_eq!(mask.bits(), (1 << 14) | (1 << 9));
    /// ```
    pub fn select<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(Self::EMPTY, |mask, name| {
            let name = name.as_ref();
            Unit::from_name(name)
                .map(|unit| mask.with(unit))
                .ok_or_else(|| SpecError::UnknownUnit(name.to_string()))
        })
    }

    /// Mask activating exactly the given units
    pub fn from_units(units: &[Unit]) -> Self {
        units.iter().fold(Self::EMPTY, |mask, &u| mask.with(u))
    }

    /// Mask with one more unit active
    #[inline]
    pub const fn with(self, unit: Unit) -> Self {
        Self(self.0 | (1 << unit.bit()))
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, unit: Unit) -> bool {
        self.0 & (1 << unit.bit()) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of active units
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Active units in table order
    pub fn units(self) -> impl Iterator<Item = Unit> {
        Unit::ALL.into_iter().filter(move |u| self.contains(*u))
    }
}

impl fmt::Display for ModuleMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NOP");
        }
        for (i, unit) in self.units().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(unit.name())?;
        }
        Ok(())
    }
}

impl From<Unit> for ModuleMask {
    fn from(unit: Unit) -> Self {
        Self::EMPTY.with(unit)
    }
}

impl std::ops::BitOr for ModuleMask {
    type Output = ModuleMask;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOr<Unit> for ModuleMask {
    type Output = ModuleMask;

    fn bitor(self, rhs: Unit) -> Self {
        self.with(rhs)
    }
}
