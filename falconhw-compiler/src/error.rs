//! Compiler errors

use falconhw_spec::{Bank, ConfigError, SpecError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Invalid degree {degree}: {reason}")]
    InvalidDegree { degree: u32, reason: ConfigError },

    #[error("Unsupported program: {0} (expected \"sign\" or \"verify\")")]
    UnsupportedProgram(String),

    #[error("{0} is not a working bank and has no allocation cursor")]
    NotAllocatable(Bank),

    #[error(transparent)]
    Spec(#[from] SpecError),
}

pub type Result<T> = std::result::Result<T, CompileError>;
