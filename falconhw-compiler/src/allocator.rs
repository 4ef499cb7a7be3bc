//! Bank/address allocation
//!
//! One monotonic cursor per working bank. Rows handed out are never reclaimed
//! within a program, so a row live for an ancestor frame is never reused by a
//! sibling subtree.

use crate::error::{CompileError, Result};
use falconhw_spec::bank::WORKING_RING_SIZE;
use falconhw_spec::Bank;
use tracing::trace;

const RING: usize = WORKING_RING_SIZE as usize;

/// Per-bank next-free row for BRAM0..BRAM3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocator {
    cursors: [u32; RING],
}

impl Allocator {
    /// Start every cursor at its bank's first free row
    pub fn new(bases: [u32; RING]) -> Self {
        Self { cursors: bases }
    }

    fn slot(bank: Bank) -> Result<usize> {
        if bank.is_working() {
            Ok(bank.index())
        } else {
            Err(CompileError::NotAllocatable(bank))
        }
    }

    /// Claim `size` rows of `bank`, returning the first
    pub fn reserve(&mut self, bank: Bank, size: u32) -> Result<u32> {
        let slot = Self::slot(bank)?;
        let base = self.cursors[slot];
        self.cursors[slot] += size;
        trace!(%bank, base, size, "reserve");
        Ok(base)
    }

    /// Claim the same `size` rows in every listed bank
    ///
    /// The base is the highest cursor among them; rows skipped in the other
    /// banks are simply left unused.
    pub fn reserve_aligned(&mut self, banks: &[Bank], size: u32) -> Result<u32> {
        let slots = banks
            .iter()
            .map(|&b| Self::slot(b))
            .collect::<Result<Vec<_>>>()?;
        let base = slots.iter().map(|&s| self.cursors[s]).max().unwrap_or(0);
        for s in slots {
            self.cursors[s] = base + size;
        }
        trace!(?banks, base, size, "reserve_aligned");
        Ok(base)
    }

    /// Bank playing the next recursion level's role
    #[inline]
    pub fn rotate_bank(current: Bank) -> Bank {
        current.rotate()
    }

    /// Next free row of a working bank
    pub fn cursor(&self, bank: Bank) -> Option<u32> {
        Self::slot(bank).ok().map(|s| self.cursors[s])
    }

    /// Highest cursor over all working banks
    pub fn high_water(&self) -> u32 {
        self.cursors.iter().copied().max().unwrap_or(0)
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new([0; RING])
    }
}
