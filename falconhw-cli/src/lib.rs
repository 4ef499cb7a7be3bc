//! Library half of the `falconhw` binary: subcommands and logging setup

#![forbid(unsafe_code)]

pub mod commands;
pub mod logging;

pub use commands::{check, disasm, emit_program, load, Loaded, OutputFormat};
