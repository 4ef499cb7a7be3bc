//! # Falcon Accelerator Instruction Set
//!
//! 128-bit fixed-layout instructions for the Falcon signing/verification
//! datapath.
//!
//! ## Key Features
//! - Seven dual-ported memory banks (BRAM0..BRAM6), 8192 rows of 128 bits each
//! - 17 functional units selected by a module-enable mask, co-issue allowed
//! - Two 13-bit row addresses shared by all active units
//! - SystemVerilog literal-array, `$readmemh` and binary program images
//! - Static dataflow checking of read-after-write ordering and port use

pub mod bank;
pub mod config;
pub mod dataflow;
pub mod encoding;
pub mod error;
pub mod instruction;
pub mod program;
pub mod unit;

pub use bank::{Bank, BankSlot, NUM_BANKS};
pub use config::{ConfigError, Degree, MemoryMap};
pub use dataflow::{Access, AccessKind, DataflowError, DataflowReport, MemoryState};
pub use encoding::{pack, Field, FieldValue, INSTRUCTION_BITS};
pub use error::{Result, SpecError};
pub use instruction::Instruction;
pub use program::{Program, ProgramHeader, ProgramKind};
pub use unit::{ModuleMask, Unit, NUM_UNITS};
