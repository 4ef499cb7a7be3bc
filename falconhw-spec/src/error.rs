//! # Error Types for the Falcon accelerator instruction set

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    // Encoding errors
    #[error("Field overflow: {field} = {value:#x} does not fit in {width} bits")]
    FieldOverflow {
        field: &'static str,
        value: u128,
        width: u32,
    },

    #[error("Invalid field layout: widths sum to {found} bits, expected {expected}")]
    LayoutWidth { expected: u32, found: u32 },

    #[error("Unknown functional unit: {0}")]
    UnknownUnit(String),

    #[error("Invalid bank index: {0} (valid range: 0-6)")]
    InvalidBank(u8),

    #[error("Reserved bits set in instruction word: {0:#034x}")]
    ReservedBitsSet(u128),

    // Program image errors
    #[error("Invalid program magic: expected 0x46485731, got {0:#010x}")]
    InvalidMagic(u32),

    #[error("Invalid program version: expected {expected}, found {found}")]
    InvalidVersion { expected: u16, found: u16 },

    #[error("Invalid program size: expected {expected} bytes, found {found} bytes")]
    InvalidProgramSize { expected: usize, found: usize },

    #[error("Unknown program kind: {0}")]
    UnknownProgramKind(u8),
}

impl SpecError {
    /// Build a `FieldOverflow` for a field of the given width
    pub fn overflow(field: &'static str, value: u128, width: u32) -> Self {
        SpecError::FieldOverflow { field, value, width }
    }

    /// Check if this error comes from building or reading an instruction word
    pub fn is_encoding(&self) -> bool {
        matches!(
            self,
            SpecError::FieldOverflow { .. }
                | SpecError::LayoutWidth { .. }
                | SpecError::InvalidBank(_)
                | SpecError::ReservedBitsSet(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SpecError>;
