//! # Falcon Accelerator Disassembler
//!
//! Reads programs back from either artifact the compiler writes and renders
//! them as instruction listings.
//!
//! - **Literal array**: the SystemVerilog `localparam`/`logic` pair included
//!   by the testbench, parsed with [`parse_literal_array`]
//! - **Binary image**: header plus big-endian words, loaded with
//!   [`falconhw_spec::Program::from_bytes`]
//!
//! ## Example
//!
//! ```rust
//! use falconhw_compiler::emit;
//! use falconhw_disassembler::{disassemble, parse_literal_array};
//!
//! let program = emit("verify", 512).unwrap();
//! let (name, words) = parse_literal_array(&program.to_systemverilog()).unwrap();
//! assert_eq!(name, "verify_instructions");
//! assert_eq!(words, program.code);
//!
//! let listing = disassemble(&program);
//! assert!(listing.contains("mod_mult_q b1, b2 -> b4 x2^8"));
//! ```

pub mod decoder;
pub mod disassembler;
pub mod error;
pub mod formatter;
pub mod lexer;
pub mod parser;

pub use decoder::{decode, decode_all};
pub use disassembler::{disassemble, disassemble_words};
pub use error::{DisassemblerError, Result};
pub use formatter::format;
pub use parser::{array_kind, parse_literal_array};

#[cfg(test)]
mod tests {
    use super::*;
    use falconhw_spec::{Instruction, SpecError, Unit};

    #[test]
    fn test_error_display() {
        let err = DisassemblerError::Syntax {
            line: 3,
            message: "expected `,`".to_string(),
        };
        assert_eq!(err.to_string(), "Syntax error at line 3: expected `,`");

        let err = DisassemblerError::CountMismatch { declared: 5, found: 4 };
        assert_eq!(err.to_string(), "Instruction count mismatch: declared 5, found 4");

        let err = DisassemblerError::from(SpecError::InvalidBank(7));
        assert_eq!(err.to_string(), "Invalid bank index: 7 (valid range: 0-6)");
    }

    #[test]
    fn test_result_type() {
        let ok: Result<u32> = Ok(1);
        assert!(ok.is_ok());
        let err: Result<u32> = Err(DisassemblerError::CountMismatch { declared: 1, found: 0 });
        assert!(err.is_err());
    }

    #[test]
    fn test_public_exports() {
        let word = Instruction::unit(Unit::Compress).encode().unwrap();
        let inst = decode(word).unwrap();
        assert_eq!(format(&inst), "compress b0@0x000 -> b0@0x000");
        assert_eq!(decode_all(&[word]).unwrap(), vec![inst]);
        assert!(disassemble_words(&[word]).contains("compress"));
    }
}
