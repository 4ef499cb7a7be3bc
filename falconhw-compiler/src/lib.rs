//! Falcon Accelerator Program Compiler
//!
//! Lowers Falcon signing (including the recursive ffsampling step) and
//! verification into programs for the accelerator instruction set.
//!
//! ## Example
//!
//! ```rust
//! use falconhw_compiler::emit;
//!
//! let program = emit("sign", 512).unwrap();
//! assert_eq!(program.len(), 4619);
//! println!("{}", program.to_systemverilog());
//! ```

pub mod allocator;
pub mod emitter;
pub mod error;
pub mod programs;
pub mod scheduler;

pub use allocator::Allocator;
pub use emitter::{Emitter, Loc};
pub use error::{CompileError, Result};
pub use programs::{emit, emit_kind, emit_sign, emit_verify, sign_len};
pub use scheduler::{instruction_count, schedule, Frame};
