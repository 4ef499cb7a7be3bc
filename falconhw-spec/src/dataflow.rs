//! # Static Dataflow Checker
//!
//! Walks a program in execution order and tracks the state of every bank row.
//! Each instruction is expanded into the row ranges its active units read,
//! write or clobber; reads are applied before writes.
//!
//! ## Port Conventions
//!
//! ```text
//! Unit            Reads                          Writes
//! COPY            bank3@a1                       bank4@a2
//! SPLIT, MERGE    bank1@a1                       bank2@a2
//! ADD_SUB         bank1@a1, bank2@a2             bank3@(a1 if addr_same else a2)
//! COMPLEX_MUL     bank1@a1, bank2@a2             bank1@a1
//! MUL_CONST       bank3@a1                       bank4@a1
//! SAMPLERZ        bank1@a1, bank2@a2 (1 row)     bank3@a1 (1 row)
//! INT_TO_DOUBLE   bank1@a1                       bank2@a2
//! MOD_MULT_Q      bank1@a1, bank2@a2             bank3@a1
//! SUB_NORM_SQ     bank1@a1, bank2@a2, bank3@a1   -
//! FFT_IFFT        bank1@a1 (full)                bank1@a1, clobbers bank2@a2
//! NTT_INTT        bank1@a1 (full)                bank2@a2 (full)
//! HASH_TO_POINT   bank3@a1 (1 row)               bank4@a2 (full)
//! DECOMPRESS      bank5@a1 (1 row)               bank6@a2, output2@a2 (full)
//! COMPRESS        bank1@a1 (full)                bank2@a2 (full)
//! ```
//!
//! Vector units touch `2^element_count` rows; "full" is one polynomial,
//! `degree / 2` rows.

use crate::bank::{Bank, BankSlot, NUM_BANKS};
use crate::config::{Degree, MemoryMap};
use crate::encoding::BANK_ROWS;
use crate::error::SpecError;
use crate::instruction::Instruction;
use crate::program::Program;
use crate::unit::Unit;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataflowError {
    #[error("instruction {index}: reads {bank} row {row:#x} before it was written")]
    ReadBeforeWrite { index: usize, bank: Bank, row: u32 },

    #[error("instruction {index}: more than one read or write stream on {bank}")]
    PortConflict { index: usize, bank: Bank },

    #[error("instruction {index}: overwrites {bank} row {row:#x} written by instruction {writer} and never read")]
    UnreadOverwrite {
        index: usize,
        bank: Bank,
        row: u32,
        writer: usize,
    },

    #[error("instruction {index}: {bank} rows {start:#x}+{rows} exceed the bank")]
    OutOfRange {
        index: usize,
        bank: Bank,
        start: u32,
        rows: u32,
    },

    #[error(transparent)]
    Spec(#[from] SpecError),
}

pub type Result<T> = std::result::Result<T, DataflowError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessKind {
    Read,
    Write,
    /// Scratch use: the rows hold garbage afterwards
    Clobber,
}

/// A contiguous row range touched by one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Access {
    pub kind: AccessKind,
    pub bank: Bank,
    pub start: u32,
    pub rows: u32,
}

impl Access {
    fn new(kind: AccessKind, bank: Bank, start: u16, rows: u32) -> Self {
        Self {
            kind,
            bank,
            start: start as u32,
            rows,
        }
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.rows
    }
}

/// Row ranges touched by one instruction
pub fn accesses(inst: &Instruction, degree: Degree) -> std::result::Result<Vec<Access>, SpecError> {
    use AccessKind::*;
    use BankSlot::*;

    let (a1, a2) = (inst.address1, inst.address2);
    let mut out = Vec::new();

    for unit in inst.modules.units() {
        let b = |slot| inst.bank(slot);
        // Whole-polynomial units ignore element_count
        let rows = if unit.is_vector() { inst.rows() } else { degree.rows() };
        match unit {
            Unit::BramRead | Unit::BramWrite => {}
            Unit::Copy => {
                out.push(Access::new(Read, b(Bank3)?, a1, rows));
                out.push(Access::new(Write, b(Bank4)?, a2, rows));
            }
            Unit::Split | Unit::Merge | Unit::IntToDouble => {
                out.push(Access::new(Read, b(Bank1)?, a1, rows));
                out.push(Access::new(Write, b(Bank2)?, a2, rows));
            }
            Unit::AddSub => {
                out.push(Access::new(Read, b(Bank1)?, a1, rows));
                out.push(Access::new(Read, b(Bank2)?, a2, rows));
                let dst = if inst.addr_same { a1 } else { a2 };
                out.push(Access::new(Write, b(Bank3)?, dst, rows));
            }
            Unit::ComplexMul => {
                out.push(Access::new(Read, b(Bank1)?, a1, rows));
                out.push(Access::new(Read, b(Bank2)?, a2, rows));
                out.push(Access::new(Write, b(Bank1)?, a1, rows));
            }
            Unit::MulConst => {
                out.push(Access::new(Read, b(Bank3)?, a1, rows));
                out.push(Access::new(Write, b(Bank4)?, a1, rows));
            }
            Unit::SamplerZ => {
                out.push(Access::new(Read, b(Bank1)?, a1, 1));
                out.push(Access::new(Read, b(Bank2)?, a2, 1));
                out.push(Access::new(Write, b(Bank3)?, a1, 1));
            }
            Unit::ModMultQ => {
                out.push(Access::new(Read, b(Bank1)?, a1, rows));
                out.push(Access::new(Read, b(Bank2)?, a2, rows));
                out.push(Access::new(Write, b(Bank3)?, a1, rows));
            }
            Unit::SubNormSq => {
                out.push(Access::new(Read, b(Bank1)?, a1, rows));
                out.push(Access::new(Read, b(Bank2)?, a2, rows));
                out.push(Access::new(Read, b(Bank3)?, a1, rows));
            }
            Unit::FftIfft => {
                out.push(Access::new(Read, b(Bank1)?, a1, rows));
                out.push(Access::new(Write, b(Bank1)?, a1, rows));
                out.push(Access::new(Clobber, b(Bank2)?, a2, rows));
            }
            Unit::NttIntt | Unit::Compress => {
                out.push(Access::new(Read, b(Bank1)?, a1, rows));
                out.push(Access::new(Write, b(Bank2)?, a2, rows));
            }
            Unit::HashToPoint => {
                out.push(Access::new(Read, b(Bank3)?, a1, 1));
                out.push(Access::new(Write, b(Bank4)?, a2, rows));
            }
            Unit::Decompress => {
                out.push(Access::new(Read, b(Bank5)?, a1, 1));
                out.push(Access::new(Write, b(Bank6)?, a2, rows));
                out.push(Access::new(Write, inst.decompress_output2_bank()?, a2, rows));
            }
        }
    }

    Ok(out)
}

/// State of one bank row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Invalid,
    Preloaded,
    Written { by: usize, read: bool },
    Clobbered,
}

/// Row states of every bank
#[derive(Debug, Clone)]
pub struct MemoryState {
    banks: Vec<Vec<RowState>>,
}

impl MemoryState {
    /// All rows invalid
    pub fn empty() -> Self {
        Self {
            banks: vec![vec![RowState::Invalid; BANK_ROWS as usize]; NUM_BANKS],
        }
    }

    /// Rows below each bank's pre-loaded count are valid
    pub fn from_map(map: &MemoryMap) -> Self {
        let mut state = Self::empty();
        for bank in Bank::ALL {
            let rows = map.rows(bank).min(BANK_ROWS) as usize;
            state.banks[bank.index()][..rows].fill(RowState::Preloaded);
        }
        state
    }

    #[inline]
    pub fn row(&self, bank: Bank, row: u32) -> RowState {
        self.banks[bank.index()][row as usize]
    }

    fn row_mut(&mut self, bank: Bank, row: u32) -> &mut RowState {
        &mut self.banks[bank.index()][row as usize]
    }
}

/// Summary of a successful check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataflowReport {
    pub instructions: usize,
    pub rows_read: u64,
    pub rows_written: u64,
    /// One past the highest row touched, per bank
    pub high_water: [u32; NUM_BANKS],
}

/// Check a program against an initial memory state
pub fn check(program: &Program, initial: &MemoryState) -> Result<DataflowReport> {
    let instructions = program.instructions()?;
    check_instructions(&instructions, program.degree, initial)
}

/// Check decoded instructions against an initial memory state
pub fn check_instructions(
    instructions: &[Instruction],
    degree: Degree,
    initial: &MemoryState,
) -> Result<DataflowReport> {
    let mut state = initial.clone();
    let mut report = DataflowReport {
        instructions: instructions.len(),
        ..DataflowReport::default()
    };

    for (index, inst) in instructions.iter().enumerate() {
        let accesses = accesses(inst, degree)?;
        check_ports(index, &accesses)?;

        for access in &accesses {
            if access.end() > BANK_ROWS {
                return Err(DataflowError::OutOfRange {
                    index,
                    bank: access.bank,
                    start: access.start,
                    rows: access.rows,
                });
            }
            let hw = &mut report.high_water[access.bank.index()];
            *hw = (*hw).max(access.end());
        }

        for access in accesses.iter().filter(|a| a.kind == AccessKind::Read) {
            for row in access.start..access.end() {
                let slot = state.row_mut(access.bank, row);
                match *slot {
                    RowState::Preloaded => {}
                    RowState::Written { by, .. } => *slot = RowState::Written { by, read: true },
                    RowState::Invalid | RowState::Clobbered => {
                        return Err(DataflowError::ReadBeforeWrite {
                            index,
                            bank: access.bank,
                            row,
                        });
                    }
                }
            }
            report.rows_read += access.rows as u64;
        }

        for access in accesses.iter().filter(|a| a.kind != AccessKind::Read) {
            for row in access.start..access.end() {
                let slot = state.row_mut(access.bank, row);
                if let RowState::Written { by, read: false } = *slot {
                    // Co-issued units may write the same rows of one stream
                    if by != index {
                        return Err(DataflowError::UnreadOverwrite {
                            index,
                            bank: access.bank,
                            row,
                            writer: by,
                        });
                    }
                }
                *slot = match access.kind {
                    AccessKind::Clobber => RowState::Clobbered,
                    _ => RowState::Written {
                        by: index,
                        read: false,
                    },
                };
            }
            if access.kind == AccessKind::Write {
                report.rows_written += access.rows as u64;
            }
        }
    }

    Ok(report)
}

/// At most one read stream and one write stream per bank
fn check_ports(index: usize, accesses: &[Access]) -> Result<()> {
    for bank in Bank::ALL {
        let mut reads: Option<u32> = None;
        let mut writes: Option<u32> = None;
        for access in accesses.iter().filter(|a| a.bank == bank) {
            let stream = if access.kind == AccessKind::Read {
                &mut reads
            } else {
                &mut writes
            };
            match *stream {
                Some(start) if start != access.start => {
                    return Err(DataflowError::PortConflict { index, bank });
                }
                _ => *stream = Some(access.start),
            }
        }
    }
    Ok(())
}
