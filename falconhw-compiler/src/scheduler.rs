//! # Recursive ffsampling Scheduler
//!
//! Lowers one ffsampling call over a degree-`n` target `(t0, t1)` into a
//! straight-line instruction sequence. Each recursion level writes into its
//! own bank of the working ring; the next level writes into the bank after it.
//!
//! ## Frame Layout
//!
//! For a frame with output bank `B`, `C = rotate(B)`, `R = n/2` rows and
//! `h = n/4` rows:
//!
//! ```text
//! B: [z0: R rows][z1: R rows]       merged output, returned address = z0
//! C: [tmp: R rows]                  LDL update t0' = t0 + (t1 - z1) * l10
//! ```
//!
//! `t0`/`t1` live in the previous level's bank. The tree bank holds, from the
//! frame's element offset: `[l10: n][T0: treesize(n/2)][T1: treesize(n/2)]`.
//!
//! ## Instruction Sequence (n > 1)
//!
//! ```text
//! SPLIT  t1 -> B@z1                      (COPY when n == 2)
//! <recurse n/2: (B@z1, B@z1+h) into C, tree T1>
//! MERGE  C@out1 -> B@z1                  (COPY when n == 2)
//! COPY   t1 -> C@tmp
//! ADD_SUB tmp -= B@z1
//! COMPLEX_MUL tmp *= tree[l10]
//! ADD_SUB tmp += t0
//! SPLIT  C@tmp -> B@z0                   (COPY when n == 2)
//! <recurse n/2: (B@z0, B@z0+h) into C, tree T0>
//! MERGE  C@out0 -> B@z0                  (COPY when n == 2)
//! ```
//!
//! A leaf (`n == 1`) is a single SAMPLERZ writing the row of `t0` in its
//! frame bank. Instruction count: `I(1) = 1`, `I(n) = 2 I(n/2) + 8`, so
//! `I(n) = 9n - 8`.

use crate::allocator::Allocator;
use crate::emitter::{self, Emitter, Loc};
use crate::error::{CompileError, Result};
use falconhw_spec::config::tree_size;
use falconhw_spec::{Bank, Degree, Instruction};
use tracing::debug;

/// One ffsampling call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Polynomial degree at this level
    pub n: u32,
    pub t0: Loc,
    pub t1: Loc,
    /// Output bank of this level
    pub bank: Bank,
    /// Element offset of this level's subtree in the tree bank
    pub tree: u32,
}

impl Frame {
    /// Rows per operand polynomial
    #[inline]
    fn rows(&self) -> u32 {
        self.n / 2
    }

    /// Element count field for whole-operand vector operations
    #[inline]
    fn element_count(&self) -> u32 {
        self.rows().trailing_zeros()
    }
}

/// Instructions emitted by [`schedule`] for degree `n`
pub const fn instruction_count(n: u32) -> u32 {
    (9 * n).saturating_sub(8)
}

/// Emit ffsampling over `frame`, returning the row of the merged output in
/// `frame.bank`
///
/// `frame.n` must be 1 (a single sample) or a supported degree. Nothing is
/// emitted for any other size.
pub fn schedule(frame: Frame, alloc: &mut Allocator, out: &mut Emitter) -> Result<u32> {
    if frame.n != 1 {
        Degree::new(frame.n).map_err(|reason| CompileError::InvalidDegree {
            degree: frame.n,
            reason,
        })?;
    }
    lower(frame, alloc, out)
}

fn lower(frame: Frame, alloc: &mut Allocator, out: &mut Emitter) -> Result<u32> {
    if frame.n == 1 {
        return leaf(frame, out);
    }

    let n = frame.n;
    let b = frame.bank;
    let c = Allocator::rotate_bank(b);
    let r = frame.rows();
    let h = n / 4;
    let ec = frame.element_count();
    // The leaves below an n == 2 frame write their own row in C
    let degraded = n == 2;

    let z0 = if degraded {
        alloc.reserve_aligned(&[b, c], n)?
    } else {
        alloc.reserve(b, n)?
    };
    let z1 = z0 + r;
    let tmp = Loc::new(c, alloc.reserve(c, r)?);

    let tree1 = frame.tree + n + tree_size(n / 2);
    let tree0 = frame.tree + n;

    debug!(n, bank = %b, z0, tmp = tmp.addr, tree = frame.tree, "ffsampling frame");

    let z1_loc = Loc::new(b, z1);
    out.push(if degraded {
        emitter::copy(frame.t1, z1_loc, ec)?
    } else {
        emitter::split(frame.t1, z1_loc, ec)?
    });

    let child1 = Frame {
        n: n / 2,
        t0: z1_loc,
        t1: z1_loc.offset(h),
        bank: c,
        tree: tree1,
    };
    let out1 = lower(child1, alloc, out)?;
    out.push(recombine(Loc::new(c, out1), z1_loc, ec, degraded)?);

    out.push(emitter::copy(frame.t1, tmp, ec)?);
    out.push(emitter::add_sub(tmp, z1_loc, c, true, true, ec)?);
    out.push(emitter::complex_mul(tmp, Loc::new(Bank::TREE, frame.tree / 2), ec)?);
    out.push(emitter::add_sub(tmp, frame.t0, c, false, true, ec)?);

    let z0_loc = Loc::new(b, z0);
    out.push(if degraded {
        emitter::copy(tmp, z0_loc, ec)?
    } else {
        emitter::split(tmp, z0_loc, ec)?
    });

    let child0 = Frame {
        n: n / 2,
        t0: z0_loc,
        t1: z0_loc.offset(h),
        bank: c,
        tree: tree0,
    };
    let out0 = lower(child0, alloc, out)?;
    out.push(recombine(Loc::new(c, out0), z0_loc, ec, degraded)?);

    Ok(z0)
}

fn recombine(src: Loc, dst: Loc, ec: u32, degraded: bool) -> Result<Instruction> {
    if degraded {
        emitter::copy(src, dst, ec)
    } else {
        emitter::merge(src, dst, ec)
    }
}

fn leaf(frame: Frame, out: &mut Emitter) -> Result<u32> {
    let fresh = out.sampler_mode();
    out.push(emitter::sampler(
        frame.t0,
        Bank::TREE,
        frame.tree,
        frame.bank,
        fresh,
    )?);
    Ok(frame.t0.addr)
}
