//! # Program Structure and Serialization
//!
//! A program is the ordered list of instruction words for one operation
//! (sign or verify) at one degree. It renders to the SystemVerilog literal
//! array the hardware testbench includes verbatim, to a `$readmemh` hex file,
//! or to a small binary image.

use crate::config::{ConfigError, Degree};
use crate::encoding::INSTRUCTION_BYTES;
use crate::error::{Result, SpecError};
use crate::instruction::Instruction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fmt::Write as _;

/// Magic number for program images: "FHW1" = 0x46485731
pub const MAGIC: u32 = 0x4648_5731;

/// Image format version
pub const VERSION: u16 = 1;

/// Which top-level operation a program implements
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramKind {
    Verify = 0,
    Sign = 1,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 2] = [ProgramKind::Verify, ProgramKind::Sign];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ProgramKind::Verify),
            1 => Some(ProgramKind::Sign),
            _ => None,
        }
    }

    /// Look up by name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name.trim()))
    }

    pub const fn name(self) -> &'static str {
        match self {
            ProgramKind::Verify => "verify",
            ProgramKind::Sign => "sign",
        }
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binary image header (16 bytes)
///
/// Binary format:
/// ```text
/// Offset  Size  Field
/// ──────────────────────────────────
/// 0x00    4     magic ("FHW1")
/// 0x04    2     version
/// 0x06    1     kind (0 = verify, 1 = sign)
/// 0x07    1     log2 of the degree
/// 0x08    4     instruction count
/// 0x0C    4     flags (reserved)
/// ```
///
/// All fields big-endian, followed by `count` big-endian 16-byte words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramHeader {
    pub magic: u32,
    pub version: u16,
    pub kind: u8,
    pub log2_degree: u8,
    pub count: u32,
    pub flags: u32,
}

impl ProgramHeader {
    /// Header size in bytes
    pub const SIZE: usize = 16;

    pub fn for_program(program: &Program) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            kind: program.kind as u8,
            log2_degree: program.degree.log2() as u8,
            count: program.code.len() as u32,
            flags: 0,
        }
    }

    /// Validate the header
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(SpecError::InvalidMagic(self.magic));
        }
        if self.version != VERSION {
            return Err(SpecError::InvalidVersion {
                expected: VERSION,
                found: self.version,
            });
        }
        self.kind()?;
        self.degree()?;
        Ok(())
    }

    pub fn kind(&self) -> Result<ProgramKind> {
        ProgramKind::from_u8(self.kind).ok_or(SpecError::UnknownProgramKind(self.kind))
    }

    pub fn degree(&self) -> Result<Degree> {
        let n = 1u32
            .checked_shl(self.log2_degree as u32)
            .ok_or(ConfigError::DegreeTooLarge(u32::MAX))?;
        Ok(Degree::new(n)?)
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];

        bytes[0..4].copy_from_slice(&self.magic.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.version.to_be_bytes());
        bytes[6] = self.kind;
        bytes[7] = self.log2_degree;
        bytes[8..12].copy_from_slice(&self.count.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.flags.to_be_bytes());

        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(SpecError::InvalidProgramSize {
                expected: Self::SIZE,
                found: bytes.len(),
            });
        }

        let header = Self {
            magic: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            version: u16::from_be_bytes([bytes[4], bytes[5]]),
            kind: bytes[6],
            log2_degree: bytes[7],
            count: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            flags: u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        };

        header.validate()?;
        Ok(header)
    }
}

impl fmt::Display for ProgramHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Falcon accelerator program")?;
        writeln!(f, "  Magic:       {:#010x}", self.magic)?;
        writeln!(f, "  Version:     {}", self.version)?;
        match self.kind() {
            Ok(kind) => writeln!(f, "  Kind:        {}", kind)?,
            Err(_) => writeln!(f, "  Kind:        unknown ({})", self.kind)?,
        }
        writeln!(f, "  Degree:      2^{}", self.log2_degree)?;
        writeln!(f, "  Count:       {} instructions", self.count)?;
        Ok(())
    }
}

/// Complete instruction program
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub kind: ProgramKind,
    pub degree: Degree,
    /// Encoded instruction words, in execution order
    pub code: Vec<u128>,
}

impl Program {
    pub fn new(kind: ProgramKind, degree: Degree, code: Vec<u128>) -> Self {
        Self { kind, degree, code }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Decode every word
    pub fn instructions(&self) -> Result<Vec<Instruction>> {
        self.code.iter().map(|&w| Instruction::decode(w)).collect()
    }

    /// Name of the SystemVerilog count parameter, e.g. `SIGN_INSTRUCTION_COUNT`
    pub fn count_param(&self) -> String {
        format!("{}_INSTRUCTION_COUNT", self.kind.name().to_ascii_uppercase())
    }

    /// Name of the SystemVerilog array, e.g. `sign_instructions`
    pub fn array_name(&self) -> String {
        format!("{}_instructions", self.kind.name())
    }

    /// Render as the SystemVerilog literal array included by the testbench
    ///
    /// ```text
    /// localparam int VERIFY_INSTRUCTION_COUNT = 5;
    /// logic [127:0] verify_instructions[VERIFY_INSTRUCTION_COUNT] = '{
    /// 128'h...,
    /// 128'h...
    /// };
    /// ```
    pub fn to_systemverilog(&self) -> String {
        let param = self.count_param();
        let mut out = String::with_capacity(64 + self.code.len() * 40);
        let _ = writeln!(out, "localparam int {} = {};", param, self.code.len());
        let _ = writeln!(out, "logic [127:0] {}[{}] = '{{", self.array_name(), param);
        for (i, word) in self.code.iter().enumerate() {
            let sep = if i + 1 < self.code.len() { "," } else { "" };
            let _ = writeln!(out, "128'h{:032x}{}", word, sep);
        }
        out.push_str("};\n");
        out
    }

    /// One word per line, 32 hex digits, for `$readmemh`
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.code.len() * 33);
        for word in &self.code {
            let _ = writeln!(out, "{:032x}", word);
        }
        out
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ProgramHeader::SIZE + self.code.len() * INSTRUCTION_BYTES);
        bytes.extend_from_slice(&ProgramHeader::for_program(self).to_bytes());
        for word in &self.code {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = ProgramHeader::from_bytes(bytes)?;

        let expected = ProgramHeader::SIZE + header.count as usize * INSTRUCTION_BYTES;
        if bytes.len() != expected {
            return Err(SpecError::InvalidProgramSize {
                expected,
                found: bytes.len(),
            });
        }

        let code = bytes[ProgramHeader::SIZE..]
            .chunks_exact(INSTRUCTION_BYTES)
            .map(|chunk| {
                let mut word = [0u8; INSTRUCTION_BYTES];
                word.copy_from_slice(chunk);
                u128::from_be_bytes(word)
            })
            .collect();

        Ok(Self {
            kind: header.kind()?,
            degree: header.degree()?,
            code,
        })
    }

    /// SHA-256 of the binary image
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.to_bytes()).into()
    }

    /// Digest as lowercase hex
    pub fn digest_hex(&self) -> String {
        self.digest().iter().fold(String::with_capacity(64), |mut s, b| {
            let _ = write!(s, "{:02x}", b);
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Program {
        Program::new(
            ProgramKind::Verify,
            Degree::FALCON_512,
            vec![0x1234, u128::MAX >> 73, 1 << 127],
        )
    }

    #[test]
    fn test_header_serialization() {
        let header = ProgramHeader::for_program(&sample());
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"FHW1");
        assert_eq!(ProgramHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_validation() {
        let mut header = ProgramHeader::for_program(&sample());
        assert!(header.validate().is_ok());

        header.magic = 0x1234_5678;
        assert_eq!(header.validate(), Err(SpecError::InvalidMagic(0x1234_5678)));
        header.magic = MAGIC;

        header.kind = 9;
        assert_eq!(header.validate(), Err(SpecError::UnknownProgramKind(9)));
        header.kind = 1;

        header.log2_degree = 11;
        assert!(matches!(header.validate(), Err(SpecError::InvalidConfig(_))));
        header.log2_degree = 200;
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_program_serialization() {
        let program = sample();
        let bytes = program.to_bytes();
        assert_eq!(bytes.len(), 16 + 3 * 16);
        assert_eq!(Program::from_bytes(&bytes).unwrap(), program);

        // Truncated image
        let err = Program::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(
            err,
            SpecError::InvalidProgramSize {
                expected: 64,
                found: 63
            }
        );
    }

    #[test]
    fn test_systemverilog() {
        let program = Program::new(ProgramKind::Sign, Degree::FALCON_512, vec![1, 0xABC]);
        let sv = program.to_systemverilog();
        let expected = "\
localparam int SIGN_INSTRUCTION_COUNT = 2;
logic [127:0] sign_instructions[SIGN_INSTRUCTION_COUNT] = '{
128'h00000000000000000000000000000001,
128'h00000000000000000000000000000abc
};
";
        assert_eq!(sv, expected);
    }

    #[test]
    fn test_hex() {
        let hex = sample().to_hex();
        let lines: Vec<_> = hex.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() == 32));
        assert_eq!(lines[2], "80000000000000000000000000000000");
    }

    #[test]
    fn test_digest_stable() {
        let a = sample();
        let b = sample();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest_hex().len(), 64);

        let mut c = sample();
        c.code[0] ^= 1;
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ProgramKind::from_name("SIGN"), Some(ProgramKind::Sign));
        assert_eq!(ProgramKind::from_name("Verify"), Some(ProgramKind::Verify));
        assert_eq!(ProgramKind::from_name("keygen"), None);
    }
}
