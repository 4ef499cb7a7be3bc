//! Cross-module tests: compiler output read back by the other crates

use falconhw_compiler::programs::SIGN_PREAMBLE_LEN;
use falconhw_compiler::{emit_sign, emit_verify, instruction_count};
use falconhw_disassembler::{format, DisassemblerError};
use falconhw_spec::dataflow::{self, DataflowError, MemoryState};
use falconhw_spec::{Bank, BankSlot, Degree, Instruction, MemoryMap, SpecError, Unit};

#[test]
fn test_every_word_uses_valid_banks() {
    let program = emit_sign(Degree::FALCON_1024).unwrap();
    for inst in program.instructions().unwrap() {
        for unit in inst.modules.units() {
            for &slot in unit.bank_slots() {
                assert!(inst.bank(slot).is_ok());
            }
        }
    }
}

#[test]
fn test_listing_names_every_unit() {
    let program = emit_sign(Degree::new(16).unwrap()).unwrap();
    let mut seen = Vec::new();
    for inst in program.instructions().unwrap() {
        let text = format(&inst);
        for unit in inst.modules.units() {
            if !seen.contains(&unit) {
                seen.push(unit);
            }
        }
        assert!(!text.is_empty());
    }
    for unit in [
        Unit::HashToPoint,
        Unit::IntToDouble,
        Unit::FftIfft,
        Unit::Copy,
        Unit::ComplexMul,
        Unit::MulConst,
        Unit::Split,
        Unit::Merge,
        Unit::AddSub,
        Unit::SamplerZ,
        Unit::Compress,
    ] {
        assert!(seen.contains(&unit), "{} never emitted", unit);
    }
}

#[test]
fn test_body_length_between_fixed_sections() {
    let degree = Degree::new(32).unwrap();
    let insts = emit_sign(degree).unwrap().instructions().unwrap();
    let body = &insts[SIGN_PREAMBLE_LEN..SIGN_PREAMBLE_LEN + instruction_count(32) as usize];
    assert!(body[0].uses(Unit::Split));
    assert!(body.last().unwrap().uses(Unit::Merge));
    assert_eq!(body.iter().filter(|i| i.uses(Unit::SamplerZ)).count(), 32);
}

#[test]
fn test_tampered_word_fails_dataflow() {
    let degree = Degree::new(8).unwrap();
    let mut insts = emit_sign(degree).unwrap().instructions().unwrap();
    // Point the first SPLIT at rows nobody wrote
    insts[SIGN_PREAMBLE_LEN] = insts[SIGN_PREAMBLE_LEN].with_address1(4000).unwrap();
    let state = MemoryState::from_map(&MemoryMap::sign(degree));
    let err = dataflow::check_instructions(&insts, degree, &state).unwrap_err();
    assert!(matches!(
        err,
        DataflowError::ReadBeforeWrite { index, bank: Bank::Bram4, row: 4000 } if index == SIGN_PREAMBLE_LEN
    ));
}

#[test]
fn test_verify_without_inputs_fails() {
    let degree = Degree::FALCON_512;
    let program = emit_verify(degree).unwrap();
    let err = dataflow::check(&program, &MemoryState::empty()).unwrap_err();
    assert!(matches!(err, DataflowError::ReadBeforeWrite { index: 0, .. }));
}

#[test]
fn test_invalid_bank_word_surfaces_through_disassembler() {
    let word = Instruction::unit(Unit::Copy).encode().unwrap() | (7 << (3 * BankSlot::Bank3.index()));
    let err = falconhw_disassembler::decode(word).unwrap_err();
    assert!(matches!(err, DisassemblerError::Spec(SpecError::InvalidBank(7))));
}
