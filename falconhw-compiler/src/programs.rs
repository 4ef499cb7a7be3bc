//! # Sign and Verify Programs
//!
//! Fixed preambles and postambles around the recursive scheduler.
//!
//! ## Verify (5 instructions)
//!
//! ```text
//! 1  NTT(BRAM0 -> BRAM2) | HASH_TO_POINT(BRAM6 -> BRAM5) | DECOMPRESS(BRAM1 -> BRAM4, BRAM3)
//! 2  NTT(BRAM4 -> BRAM1)
//! 3  MOD_MULT_Q(BRAM1 * BRAM2 -> BRAM4)
//! 4  INTT(BRAM4 -> BRAM1)
//! 5  SUB_NORM_SQ(BRAM5, BRAM1, BRAM3)
//! ```
//!
//! ## Sign (9n + 11 instructions)
//!
//! BRAM0..BRAM3 are pre-loaded with the FFT basis
//! `B = [[g, -f], [G, -F]]`. The preamble hashes the message into BRAM5,
//! converts it to FFT form and builds the target `t0 = c * b11 / q`
//! (BRAM5@0) and `t1 = -c * b01 / q` (BRAM4@0). After ffsampling into BRAM0
//! the postamble forms `s = (t - z) * B`, returns both halves to coefficient
//! form and compresses `s2` into BRAM4@0. `s1` stays in BRAM1 for the host,
//! which reads it back for the signature norm bound.

use crate::allocator::Allocator;
use crate::emitter::{self, Emitter, Loc};
use crate::error::{CompileError, Result};
use crate::scheduler::{self, Frame};
use falconhw_spec::config::BASIS_ROWS;
use falconhw_spec::{Bank, BankSlot, Degree, Instruction, Program, ProgramKind, Unit};
use tracing::{debug, instrument};

/// Basis block `b00 = ĝ` in sign programs
pub const BASIS_B00: Loc = Loc::new(Bank::Bram0, 0);
/// Basis block `b11 = -F̂`
pub const BASIS_B11: Loc = Loc::new(Bank::Bram1, 0);
/// Basis block `b10 = Ĝ`
pub const BASIS_B10: Loc = Loc::new(Bank::Bram2, 0);
/// Basis block `b01 = -f̂`
pub const BASIS_B01: Loc = Loc::new(Bank::Bram3, 0);

/// Where the sign preamble leaves the target
pub const SIGN_T0: Loc = Loc::new(Bank::Bram5, 0);
pub const SIGN_T1: Loc = Loc::new(Bank::Bram4, 0);

/// Number of instructions in a verify program
pub const VERIFY_LEN: usize = 5;
/// Instructions before the ffsampling body of a sign program
pub const SIGN_PREAMBLE_LEN: usize = 6;
/// Instructions after the ffsampling body of a sign program
pub const SIGN_POSTAMBLE_LEN: usize = 13;

/// Total instructions in a sign program of degree `n`
pub const fn sign_len(n: u32) -> usize {
    SIGN_PREAMBLE_LEN + scheduler::instruction_count(n) as usize + SIGN_POSTAMBLE_LEN
}

/// Emit a named program
///
/// `name` is `"sign"` or `"verify"`, case-insensitive. The degree is checked
/// before anything else.
#[instrument(level = "info")]
pub fn emit(name: &str, degree: u32) -> Result<Program> {
    let degree = Degree::new(degree).map_err(|reason| CompileError::InvalidDegree { degree, reason })?;
    let kind = ProgramKind::from_name(name).ok_or_else(|| CompileError::UnsupportedProgram(name.to_string()))?;
    emit_kind(kind, degree)
}

/// Emit the program for `kind`
pub fn emit_kind(kind: ProgramKind, degree: Degree) -> Result<Program> {
    match kind {
        ProgramKind::Verify => emit_verify(degree),
        ProgramKind::Sign => emit_sign(degree),
    }
}

/// Signature verification
pub fn emit_verify(degree: Degree) -> Result<Program> {
    let mut out = Emitter::new();
    let ec = degree.element_count() as u32;

    out.push(
        Instruction::unit(Unit::NttIntt)
            .also(Unit::Decompress)
            .also(Unit::HashToPoint)
            .with_bank(BankSlot::Bank1, Bank::Bram0)
            .with_bank(BankSlot::Bank2, Bank::Bram2)
            .with_bank(BankSlot::Bank3, Bank::Bram6)
            .with_bank(BankSlot::Bank4, Bank::Bram5)
            .with_bank(BankSlot::Bank5, Bank::Bram1)
            .with_bank(BankSlot::Bank6, Bank::Bram4)
            .with_decompress_output2(Bank::Bram3),
    );
    out.push(emitter::ntt(
        Loc::new(Bank::Bram4, 0),
        Loc::new(Bank::Bram1, 0),
        false,
    )?);
    out.push(
        Instruction::unit(Unit::ModMultQ)
            .with_bank(BankSlot::Bank1, Bank::Bram1)
            .with_bank(BankSlot::Bank2, Bank::Bram2)
            .with_bank(BankSlot::Bank3, Bank::Bram4)
            .with_element_count(ec)?,
    );
    out.push(emitter::ntt(
        Loc::new(Bank::Bram4, 0),
        Loc::new(Bank::Bram1, 0),
        true,
    )?);
    out.push(
        Instruction::unit(Unit::SubNormSq)
            .with_bank(BankSlot::Bank1, Bank::Bram5)
            .with_bank(BankSlot::Bank2, Bank::Bram1)
            .with_bank(BankSlot::Bank3, Bank::Bram3)
            .with_element_count(ec)?,
    );

    debug!(degree = degree.get(), instructions = out.len(), "verify program");
    out.finish(ProgramKind::Verify, degree)
}

/// Signing: preamble, ffsampling, postamble
pub fn emit_sign(degree: Degree) -> Result<Program> {
    let mut out = Emitter::new();
    let mut alloc = Allocator::new([BASIS_ROWS; 4]);

    sign_preamble(degree, &mut out)?;

    let frame = Frame {
        n: degree.get(),
        t0: SIGN_T0,
        t1: SIGN_T1,
        bank: Bank::Bram0,
        tree: 0,
    };
    let z = scheduler::schedule(frame, &mut alloc, &mut out)?;
    debug!(z, high_water = alloc.high_water(), "ffsampling done");

    sign_postamble(degree, Loc::new(frame.bank, z), &mut alloc, &mut out)?;

    debug!(degree = degree.get(), instructions = out.len(), "sign program");
    out.finish(ProgramKind::Sign, degree)
}

fn sign_preamble(degree: Degree, out: &mut Emitter) -> Result<()> {
    let ec = degree.element_count() as u32;
    let msg = Loc::new(Bank::Bram4, 0);

    // c = HashToPoint(msg)
    out.push(
        Instruction::unit(Unit::HashToPoint)
            .with_bank(BankSlot::Bank3, msg.bank)
            .with_bank(BankSlot::Bank4, SIGN_T0.bank),
    );
    out.push(emitter::int_to_double(SIGN_T0, SIGN_T0, ec)?);
    out.push(emitter::fft(SIGN_T0, SIGN_T1, false)?);

    // t1 <- c, t0 <- c * b11
    out.push(
        emitter::copy(SIGN_T0, SIGN_T1, ec)?
            .also(Unit::ComplexMul)
            .with_bank(BankSlot::Bank1, SIGN_T0.bank)
            .with_bank(BankSlot::Bank2, BASIS_B11.bank),
    );

    // t1 *= b01, t0 *= 1/q
    out.push(
        emitter::complex_mul(SIGN_T1, BASIS_B01, ec)?
            .also(Unit::MulConst)
            .with_bank(BankSlot::Bank3, SIGN_T0.bank)
            .with_bank(BankSlot::Bank4, SIGN_T0.bank)
            .with_mul_const_sel(true),
    );

    // t1 *= -1/q
    out.push(emitter::mul_const(SIGN_T1, false, ec)?);
    Ok(())
}

fn sign_postamble(degree: Degree, z: Loc, alloc: &mut Allocator, out: &mut Emitter) -> Result<()> {
    let ec = degree.element_count() as u32;
    let r = degree.rows();
    let z0 = z;
    let z1 = z.offset(r);
    let d0 = SIGN_T0;
    let d1 = SIGN_T1;
    let s0 = Loc::new(Bank::Bram1, alloc.reserve(Bank::Bram1, r)?);
    let s1 = Loc::new(Bank::Bram3, alloc.reserve(Bank::Bram3, r)?);

    // d = t - z, in place
    out.push(emitter::add_sub(d0, z0, d0.bank, true, true, ec)?);
    out.push(emitter::add_sub(d1, z1, d1.bank, true, true, ec)?);
    out.push(emitter::copy(d0, s0, ec)?);
    out.push(emitter::copy(d1, s1, ec)?);

    // s2 = d0 * b01 + d1 * b11
    out.push(emitter::complex_mul(d0, BASIS_B01, ec)?);
    out.push(emitter::complex_mul(d1, BASIS_B11, ec)?);
    out.push(emitter::add_sub(d0, d1, d0.bank, false, true, ec)?);

    // s1 = d0 * b00 + d1 * b10, left in BRAM1 for the host norm check
    out.push(emitter::complex_mul(s0, BASIS_B00, ec)?);
    out.push(emitter::complex_mul(s1, BASIS_B10, ec)?);
    out.push(emitter::add_sub(s0, s1, s0.bank, false, true, ec)?);

    out.push(emitter::fft(d0, d1, true)?);
    out.push(emitter::fft(s0, s1, true)?);
    out.push(emitter::compress(d0, d1)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_len() {
        assert_eq!(sign_len(512), 4619);
        assert_eq!(sign_len(2), 29);
    }

    #[test]
    fn test_verify_shape() {
        let program = emit_verify(Degree::FALCON_512).unwrap();
        assert_eq!(program.len(), VERIFY_LEN);
        let insts = program.instructions().unwrap();
        assert!(insts[3].mode);
        assert_eq!(insts[2].element_count, 8);
        assert_eq!(insts[4].element_count, 8);
    }

    #[test]
    fn test_sign_preamble_targets() {
        let program = emit_sign(Degree::new(4).unwrap()).unwrap();
        assert_eq!(program.len(), sign_len(4));
        let insts = program.instructions().unwrap();

        let co_issued = insts[3];
        assert!(co_issued.uses(Unit::Copy) && co_issued.uses(Unit::ComplexMul));
        assert_eq!(co_issued.bank(BankSlot::Bank3).unwrap(), Bank::Bram5);
        assert_eq!(co_issued.bank(BankSlot::Bank4).unwrap(), Bank::Bram4);
        assert_eq!(co_issued.bank(BankSlot::Bank1).unwrap(), Bank::Bram5);
        assert_eq!(co_issued.bank(BankSlot::Bank2).unwrap(), Bank::Bram1);

        let last = insts[insts.len() - 1];
        assert!(last.uses(Unit::Compress));
        assert_eq!(last.bank(BankSlot::Bank2).unwrap(), Bank::Bram4);
    }

    #[test]
    fn test_sign_postamble_subtracts_z_from_t() {
        let program = emit_sign(Degree::new(8).unwrap()).unwrap();
        let insts = program.instructions().unwrap();
        let post = &insts[insts.len() - SIGN_POSTAMBLE_LEN..];

        for (inst, target) in post[..2].iter().zip([SIGN_T0, SIGN_T1]) {
            assert!(inst.uses(Unit::AddSub) && inst.add_sub && inst.addr_same);
            assert_eq!(inst.bank(BankSlot::Bank1).unwrap(), target.bank);
            assert_eq!(inst.bank(BankSlot::Bank2).unwrap(), Bank::Bram0);
            assert_eq!(inst.bank(BankSlot::Bank3).unwrap(), target.bank);
            assert_eq!(u32::from(inst.address1), target.addr);
        }

        // s2 from b01/b11, s1 from b00/b10
        assert_eq!(post[4].bank(BankSlot::Bank2).unwrap(), BASIS_B01.bank);
        assert_eq!(post[5].bank(BankSlot::Bank2).unwrap(), BASIS_B11.bank);
        assert_eq!(post[7].bank(BankSlot::Bank2).unwrap(), BASIS_B00.bank);
        assert_eq!(post[8].bank(BankSlot::Bank2).unwrap(), BASIS_B10.bank);
        assert!(!post[6].add_sub && !post[9].add_sub);

        // s1 ends in coefficient form in BRAM1
        let s1_ifft = post[11];
        assert!(s1_ifft.uses(Unit::FftIfft) && s1_ifft.mode);
        assert_eq!(s1_ifft.bank(BankSlot::Bank1).unwrap(), Bank::Bram1);
    }

    #[test]
    fn test_emit_kind_matches_emit() {
        let by_kind = emit_kind(ProgramKind::Sign, Degree::new(16).unwrap()).unwrap();
        assert_eq!(by_kind, emit("sign", 16).unwrap());
    }

    #[test]
    fn test_emit_by_name() {
        assert_eq!(emit("VERIFY", 512).unwrap().kind, ProgramKind::Verify);
        assert_eq!(
            emit("keygen", 512).unwrap_err(),
            CompileError::UnsupportedProgram("keygen".to_string())
        );
        assert!(matches!(
            emit("keygen", 500),
            Err(CompileError::InvalidDegree { degree: 500, .. })
        ));
    }
}
