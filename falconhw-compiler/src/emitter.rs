//! Instruction buffer and builders for the single-unit instruction shapes
//! used by the scheduler and the program emitters

use crate::error::Result;
use falconhw_spec::{Bank, BankSlot, Degree, Instruction, Program, ProgramKind, Unit};
use std::fmt;
use tracing::trace;

/// A row address in a bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Loc {
    pub bank: Bank,
    pub addr: u32,
}

impl Loc {
    pub const fn new(bank: Bank, addr: u32) -> Self {
        Self { bank, addr }
    }

    /// Same bank, `rows` further
    pub const fn offset(self, rows: u32) -> Self {
        Self {
            bank: self.bank,
            addr: self.addr + rows,
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.bank, self.addr)
    }
}

/// Ordered instruction buffer for one program
///
/// Nothing leaves the buffer until [`Emitter::finish`] encodes every
/// instruction, so a failed emission never yields a partial program.
#[derive(Debug, Default)]
pub struct Emitter {
    instructions: Vec<Instruction>,
    sampler_seeded: bool,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, inst: Instruction) {
        trace!(index = self.instructions.len(), modules = %inst.modules, "emit");
        self.instructions.push(inst);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// SAMPLERZ mode bit: set for the first sampler call only
    pub fn sampler_mode(&mut self) -> bool {
        !std::mem::replace(&mut self.sampler_seeded, true)
    }

    /// Encode everything into a program
    pub fn finish(self, kind: ProgramKind, degree: Degree) -> Result<Program> {
        let code = self
            .instructions
            .iter()
            .map(Instruction::encode)
            .collect::<falconhw_spec::Result<Vec<u128>>>()?;
        Ok(Program::new(kind, degree, code))
    }
}

/// COPY `src` (bank3/address1) to `dst` (bank4/address2)
pub fn copy(src: Loc, dst: Loc, element_count: u32) -> Result<Instruction> {
    Ok(Instruction::unit(Unit::Copy)
        .with_bank(BankSlot::Bank3, src.bank)
        .with_bank(BankSlot::Bank4, dst.bank)
        .with_address1(src.addr)?
        .with_address2(dst.addr)?
        .with_element_count(element_count)?)
}

/// Single-source unit reading bank1/address1 and writing bank2/address2
fn one_to_one(unit: Unit, src: Loc, dst: Loc, element_count: u32) -> Result<Instruction> {
    Ok(Instruction::unit(unit)
        .with_bank(BankSlot::Bank1, src.bank)
        .with_bank(BankSlot::Bank2, dst.bank)
        .with_address1(src.addr)?
        .with_address2(dst.addr)?
        .with_element_count(element_count)?)
}

pub fn split(src: Loc, dst: Loc, element_count: u32) -> Result<Instruction> {
    one_to_one(Unit::Split, src, dst, element_count)
}

pub fn merge(src: Loc, dst: Loc, element_count: u32) -> Result<Instruction> {
    one_to_one(Unit::Merge, src, dst, element_count)
}

pub fn int_to_double(src: Loc, dst: Loc, element_count: u32) -> Result<Instruction> {
    one_to_one(Unit::IntToDouble, src, dst, element_count)
}

/// COMPRESS one full polynomial
pub fn compress(src: Loc, dst: Loc) -> Result<Instruction> {
    one_to_one(Unit::Compress, src, dst, 0)
}

/// NTT (or INTT) of a full polynomial
pub fn ntt(src: Loc, dst: Loc, inverse: bool) -> Result<Instruction> {
    Ok(one_to_one(Unit::NttIntt, src, dst, 0)?.with_mode(inverse))
}

/// In-place FFT (or IFFT) of `data`, using `scratch` as work rows
pub fn fft(data: Loc, scratch: Loc, inverse: bool) -> Result<Instruction> {
    Ok(one_to_one(Unit::FftIfft, data, scratch, 0)?.with_mode(inverse))
}

/// `lhs ± rhs` into `out`
///
/// With `same` the result lands at `lhs.addr`, otherwise at `rhs.addr`.
pub fn add_sub(
    lhs: Loc,
    rhs: Loc,
    out: Bank,
    subtract: bool,
    same: bool,
    element_count: u32,
) -> Result<Instruction> {
    Ok(Instruction::unit(Unit::AddSub)
        .with_bank(BankSlot::Bank1, lhs.bank)
        .with_bank(BankSlot::Bank2, rhs.bank)
        .with_bank(BankSlot::Bank3, out)
        .with_address1(lhs.addr)?
        .with_address2(rhs.addr)?
        .with_element_count(element_count)?
        .with_add_sub(subtract)
        .with_addr_same(same))
}

/// `acc *= rhs`, pointwise complex
pub fn complex_mul(acc: Loc, rhs: Loc, element_count: u32) -> Result<Instruction> {
    Ok(Instruction::unit(Unit::ComplexMul)
        .with_bank(BankSlot::Bank1, acc.bank)
        .with_bank(BankSlot::Bank2, rhs.bank)
        .with_address1(acc.addr)?
        .with_address2(rhs.addr)?
        .with_element_count(element_count)?)
}

/// In-place multiply by constant `sel`
pub fn mul_const(data: Loc, sel: bool, element_count: u32) -> Result<Instruction> {
    Ok(Instruction::unit(Unit::MulConst)
        .with_bank(BankSlot::Bank3, data.bank)
        .with_bank(BankSlot::Bank4, data.bank)
        .with_address1(data.addr)?
        .with_element_count(element_count)?
        .with_mul_const_sel(sel))
}

/// Sample one row from `target` and tree element `tree_elem` of `tree`,
/// writing the same row of `out`
pub fn sampler(target: Loc, tree: Bank, tree_elem: u32, out: Bank, fresh: bool) -> Result<Instruction> {
    Ok(Instruction::unit(Unit::SamplerZ)
        .with_bank(BankSlot::Bank1, target.bank)
        .with_bank(BankSlot::Bank2, tree)
        .with_bank(BankSlot::Bank3, out)
        .with_address1(target.addr)?
        .with_address2(tree_elem / 2)?
        .with_add_sub(tree_elem % 2 == 1)
        .with_addr_same(true)
        .with_mode(fresh))
}
