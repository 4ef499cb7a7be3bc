//! Disassembler errors

use falconhw_spec::SpecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisassemblerError {
    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Instruction count mismatch: declared {declared}, found {found}")]
    CountMismatch { declared: usize, found: usize },

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;
