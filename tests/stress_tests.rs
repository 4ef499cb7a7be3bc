//! Stress tests for falconhw
//!
//! Largest degrees, repeated emission and arbitrary words fed through the
//! readers.

use falconhw_compiler::{emit, emit_sign, sign_len, Allocator, Emitter, Frame, Loc};
use falconhw_disassembler::{disassemble_words, parse_literal_array};
use falconhw_spec::dataflow::{self, MemoryState};
use falconhw_spec::encoding::{RESERVED_MASK, RESERVED_SHIFT};
use falconhw_spec::{Bank, Degree, Instruction, MemoryMap, Program, ProgramKind};
use proptest::prelude::*;

// ============================================================================
// Large Programs
// ============================================================================

#[test]
fn test_sign_1024_dataflow() {
    let degree = Degree::FALCON_1024;
    let program = emit_sign(degree).unwrap();
    assert_eq!(program.len(), 9227);
    let report = dataflow::check(&program, &MemoryState::from_map(&MemoryMap::sign(degree))).unwrap();
    assert!(report.high_water.iter().all(|&hw| hw <= 8192));
    assert!(report.rows_written > 0 && report.rows_read > 0);
}

#[test]
fn test_sign_1024_listing() {
    let program = emit("sign", 1024).unwrap();
    let listing = disassemble_words(&program.code);
    assert_eq!(listing.lines().count(), sign_len(1024));
    assert!(!listing.contains("ERROR"));
}

#[test]
fn test_repeated_emission_is_stable() {
    let first = emit("sign", 1024).unwrap().digest();
    for _ in 0..5 {
        assert_eq!(emit("sign", 1024).unwrap().digest(), first);
    }
}

#[test]
fn test_schedule_from_high_base_overflows_cleanly() {
    let mut alloc = Allocator::new([7000; 4]);
    let mut out = Emitter::new();
    let frame = Frame {
        n: 1024,
        t0: Loc::new(Bank::Bram5, 0),
        t1: Loc::new(Bank::Bram4, 0),
        bank: Bank::Bram0,
        tree: 0,
    };
    assert!(falconhw_compiler::schedule(frame, &mut alloc, &mut out).is_err());
}

// ============================================================================
// Arbitrary Input
// ============================================================================

proptest! {
    #[test]
    fn prop_listing_never_panics(words in prop::collection::vec(any::<u128>(), 0..64)) {
        let listing = disassemble_words(&words);
        prop_assert_eq!(listing.lines().count(), words.len());
    }

    #[test]
    fn prop_decoded_words_reencode(raw in any::<u128>()) {
        let word = raw & !(RESERVED_MASK << RESERVED_SHIFT);
        if let Ok(inst) = Instruction::decode(word) {
            prop_assert_eq!(inst.encode().unwrap(), word);
        }
    }

    #[test]
    fn prop_image_roundtrip(words in prop::collection::vec(any::<u128>(), 0..64), sign in any::<bool>()) {
        let kind = if sign { ProgramKind::Sign } else { ProgramKind::Verify };
        let program = Program::new(kind, Degree::FALCON_512, words);
        prop_assert_eq!(Program::from_bytes(&program.to_bytes()).unwrap(), program.clone());
        let (_, parsed) = parse_literal_array(&program.to_systemverilog()).unwrap();
        prop_assert_eq!(parsed, program.code);
    }
}
