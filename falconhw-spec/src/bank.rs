//! Memory banks and the instruction's bank slots

use crate::error::{Result, SpecError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of memory banks on the datapath
pub const NUM_BANKS: usize = 7;

/// Banks taking part in the scheduler's rotation
pub const WORKING_RING_SIZE: u8 = 4;

/// Dual-ported memory bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Bank {
    Bram0 = 0,
    Bram1 = 1,
    Bram2 = 2,
    Bram3 = 3,
    Bram4 = 4,
    Bram5 = 5,
    Bram6 = 6,
}

impl Bank {
    pub const ALL: [Bank; NUM_BANKS] = [
        Bank::Bram0,
        Bank::Bram1,
        Bank::Bram2,
        Bank::Bram3,
        Bank::Bram4,
        Bank::Bram5,
        Bank::Bram6,
    ];

    /// BRAM0..BRAM3, rotated through by recursion depth
    pub const WORKING_RING: [Bank; WORKING_RING_SIZE as usize] =
        [Bank::Bram0, Bank::Bram1, Bank::Bram2, Bank::Bram3];

    /// Bank holding the sampler's LDL tree in sign programs
    pub const TREE: Bank = Bank::Bram6;

    /// Convert a 3-bit index to a bank
    pub fn from_index(index: u8) -> Result<Self> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(SpecError::InvalidBank(index))
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether this bank belongs to the working ring
    #[inline]
    pub const fn is_working(self) -> bool {
        (self as u8) < WORKING_RING_SIZE
    }

    /// Next bank of the working ring; banks outside the ring re-enter it
    /// at `index mod 4` plus one
    #[inline]
    pub fn rotate(self) -> Bank {
        Self::WORKING_RING[((self as u8 + 1) % WORKING_RING_SIZE) as usize]
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BRAM{}", *self as u8)
    }
}

/// One of the six bank fields of an instruction word
///
/// Each unit reads and writes through fixed slots; see [`crate::dataflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BankSlot {
    Bank1 = 0,
    Bank2 = 1,
    Bank3 = 2,
    Bank4 = 3,
    Bank5 = 4,
    Bank6 = 5,
}

impl BankSlot {
    pub const ALL: [BankSlot; 6] = [
        BankSlot::Bank1,
        BankSlot::Bank2,
        BankSlot::Bank3,
        BankSlot::Bank4,
        BankSlot::Bank5,
        BankSlot::Bank6,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Field name used in layouts and listings
    pub const fn name(self) -> &'static str {
        match self {
            BankSlot::Bank1 => "bank1",
            BankSlot::Bank2 => "bank2",
            BankSlot::Bank3 => "bank3",
            BankSlot::Bank4 => "bank4",
            BankSlot::Bank5 => "bank5",
            BankSlot::Bank6 => "bank6",
        }
    }
}

impl fmt::Display for BankSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index() {
        for i in 0..7u8 {
            assert_eq!(Bank::from_index(i).unwrap().as_u8(), i);
        }
        assert_eq!(Bank::from_index(7), Err(SpecError::InvalidBank(7)));
    }

    #[test]
    fn test_rotate() {
        assert_eq!(Bank::Bram0.rotate(), Bank::Bram1);
        assert_eq!(Bank::Bram2.rotate(), Bank::Bram3);
        assert_eq!(Bank::Bram3.rotate(), Bank::Bram0);

        // Four rotations return to the start
        let mut b = Bank::Bram1;
        for _ in 0..4 {
            b = b.rotate();
        }
        assert_eq!(b, Bank::Bram1);
    }

    #[test]
    fn test_working_ring() {
        assert!(Bank::Bram3.is_working());
        assert!(!Bank::Bram4.is_working());
        assert!(!Bank::TREE.is_working());
    }

    #[test]
    fn test_display() {
        assert_eq!(Bank::Bram5.to_string(), "BRAM5");
        assert_eq!(BankSlot::Bank3.to_string(), "bank3");
    }
}
