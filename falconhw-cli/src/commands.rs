//! Subcommand implementations
//!
//! Each command returns its output instead of printing it so `main` owns
//! stdout and files.

use anyhow::{Context, Result};
use clap::ValueEnum;
use falconhw_compiler::emit;
use falconhw_disassembler::{array_kind, disassemble, disassemble_words, parse_literal_array};
use falconhw_spec::dataflow::{self, MemoryState};
use falconhw_spec::program::MAGIC;
use falconhw_spec::{Bank, MemoryMap, Program, ProgramKind};
use std::fmt::Write;
use tracing::{debug, info};

/// Artifact written by `emit`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// SystemVerilog literal array
    #[default]
    Sv,
    /// One 32-digit hex word per line
    Hex,
    /// Binary image with header
    Bin,
}

/// Compile `name` at `degree` and render it
pub fn emit_program(name: &str, degree: u32, format: OutputFormat) -> Result<Vec<u8>> {
    let program = emit(name, degree).with_context(|| format!("failed to emit {} program", name))?;
    info!(
        kind = %program.kind,
        degree = %program.degree,
        instructions = program.len(),
        "emitted program"
    );
    Ok(match format {
        OutputFormat::Sv => program.to_systemverilog().into_bytes(),
        OutputFormat::Hex => program.to_hex().into_bytes(),
        OutputFormat::Bin => program.to_bytes(),
    })
}

/// A program read back from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded {
    /// Binary image, header included
    Image(Program),
    /// Literal array: array name and words
    Array(String, Vec<u128>),
}

/// Read either artifact, telling them apart by the image magic
pub fn load(bytes: &[u8]) -> Result<Loaded> {
    if bytes.starts_with(&MAGIC.to_be_bytes()) {
        let program = Program::from_bytes(bytes).context("invalid program image")?;
        debug!(kind = %program.kind, words = program.len(), "loaded binary image");
        return Ok(Loaded::Image(program));
    }
    let text = std::str::from_utf8(bytes).context("input is neither a program image nor text")?;
    let (name, words) = parse_literal_array(text).context("invalid literal array")?;
    debug!(array = %name, words = words.len(), "loaded literal array");
    Ok(Loaded::Array(name, words))
}

/// Listing for either artifact
pub fn disasm(bytes: &[u8]) -> Result<String> {
    Ok(match load(bytes)? {
        Loaded::Image(program) => disassemble(&program),
        Loaded::Array(name, words) => {
            let mut out = String::new();
            let kind = array_kind(&name).map_or("unknown", ProgramKind::name);
            let _ = writeln!(out, "; {} ({}), {} instructions", name, kind, words.len());
            out.push('\n');
            out.push_str(&disassemble_words(&words));
            out
        }
    })
}

/// Compile `name` at `degree`, run the dataflow checker and report
pub fn check(name: &str, degree: u32) -> Result<String> {
    let program = emit(name, degree).with_context(|| format!("failed to emit {} program", name))?;
    let map = match program.kind {
        ProgramKind::Sign => MemoryMap::sign(program.degree),
        ProgramKind::Verify => MemoryMap::verify(program.degree),
    };
    let report = dataflow::check(&program, &MemoryState::from_map(&map)).with_context(|| {
        format!("{} program of degree {} failed dataflow check", program.kind, program.degree)
    })?;

    let mut out = String::new();
    let _ = writeln!(out, "program:      {} (n = {})", program.kind, program.degree);
    let _ = writeln!(out, "instructions: {}", report.instructions);
    let _ = writeln!(out, "rows read:    {}", report.rows_read);
    let _ = writeln!(out, "rows written: {}", report.rows_written);
    for bank in Bank::ALL {
        let hw = report.high_water[bank.index()];
        if hw > 0 {
            let _ = writeln!(out, "{:<14}{} rows", format!("{}:", bank), hw);
        }
    }
    let _ = writeln!(out, "sha256:       {}", program.digest_hex());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_formats() {
        let sv = emit_program("verify", 512, OutputFormat::Sv).unwrap();
        assert!(String::from_utf8(sv).unwrap().starts_with("localparam int VERIFY_INSTRUCTION_COUNT = 5;"));

        let hex = emit_program("verify", 512, OutputFormat::Hex).unwrap();
        assert_eq!(String::from_utf8(hex).unwrap().lines().count(), 5);

        let bin = emit_program("verify", 512, OutputFormat::Bin).unwrap();
        assert_eq!(bin.len(), 16 + 5 * 16);
    }

    #[test]
    fn test_emit_errors_carry_context() {
        let err = emit_program("keygen", 512, OutputFormat::Sv).unwrap_err();
        assert!(err.to_string().contains("failed to emit keygen program"));
        assert!(format!("{:#}", err).contains("keygen"));
    }

    #[test]
    fn test_load_both_artifacts() {
        let bin = emit_program("sign", 16, OutputFormat::Bin).unwrap();
        assert!(matches!(load(&bin).unwrap(), Loaded::Image(p) if p.kind == ProgramKind::Sign));

        let sv = emit_program("sign", 16, OutputFormat::Sv).unwrap();
        match load(&sv).unwrap() {
            Loaded::Array(name, words) => {
                assert_eq!(name, "sign_instructions");
                assert_eq!(words.len(), falconhw_compiler::sign_len(16));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(load(&[0xff, 0xfe, 0x00]).is_err());
        assert!(load(b"module top; endmodule").is_err());
    }

    #[test]
    fn test_check_report() {
        let report = check("verify", 512).unwrap();
        assert!(report.contains("instructions: 5"));
        assert!(report.contains("BRAM6:"));
        assert!(report.contains("sha256:"));
    }
}
