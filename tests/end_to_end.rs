//! End-to-end tests for the falconhw toolchain
//!
//! These tests follow a program through the complete workflow:
//! 1. Compile sign or verify for a degree
//! 2. Render the literal array, hex listing or binary image
//! 3. Read the artifact back and decode every word
//! 4. Run the dataflow checker over the decoded instructions

use falconhw_compiler::{emit, sign_len};
use falconhw_disassembler::{decode_all, disassemble, parse_literal_array};
use falconhw_spec::dataflow::{self, MemoryState};
use falconhw_spec::{Degree, MemoryMap, Program, ProgramKind};

const VERIFY_512: &str = "\
localparam int VERIFY_INSTRUCTION_COUNT = 5;
logic [127:0] verify_instructions[VERIFY_INSTRUCTION_COUNT] = '{
128'h1204000000000000000c000000021b90,
128'h0200000000000000000000000000000c,
128'h00100000000000000002000000000111,
128'h0200000000000000000010000000000c,
128'h000800000000000000020000000000cd
};
";

fn initial_state(kind: ProgramKind, degree: Degree) -> MemoryState {
    match kind {
        ProgramKind::Sign => MemoryState::from_map(&MemoryMap::sign(degree)),
        ProgramKind::Verify => MemoryState::from_map(&MemoryMap::verify(degree)),
    }
}

// ============================================================================
// Golden output
// ============================================================================

#[test]
fn test_verify_512_literal_array() {
    let program = emit("verify", 512).unwrap();
    assert_eq!(program.to_systemverilog(), VERIFY_512);
}

#[test]
fn test_verify_512_hex() {
    let program = emit("verify", 512).unwrap();
    let expected: String = VERIFY_512
        .lines()
        .filter_map(|l| l.strip_prefix("128'h"))
        .map(|l| format!("{}\n", l.trim_end_matches(',')))
        .collect();
    assert_eq!(program.to_hex(), expected);
}

// ============================================================================
// Compile -> Artifact -> Check
// ============================================================================

#[test]
fn test_literal_array_pipeline() {
    for kind in ProgramKind::ALL {
        for k in [1u32, 4, 9, 10] {
            let program = emit(kind.name(), 1 << k).unwrap();
            let (name, words) = parse_literal_array(&program.to_systemverilog()).unwrap();
            assert_eq!(name, program.array_name());

            let decoded = decode_all(&words).unwrap();
            let reencoded: Vec<u128> = decoded.iter().map(|i| i.encode().unwrap()).collect();
            assert_eq!(reencoded, words);

            let state = initial_state(kind, program.degree);
            let report = dataflow::check_instructions(&decoded, program.degree, &state).unwrap();
            assert_eq!(report.instructions, words.len());
        }
    }
}

#[test]
fn test_binary_image_pipeline() {
    let program = emit("sign", 512).unwrap();
    let bytes = program.to_bytes();
    assert_eq!(bytes.len(), 16 + sign_len(512) * 16);

    let restored = Program::from_bytes(&bytes).unwrap();
    assert_eq!(restored.digest(), program.digest());
    assert_eq!(disassemble(&restored), disassemble(&program));

    let state = initial_state(restored.kind, restored.degree);
    dataflow::check(&restored, &state).unwrap();
}

#[test]
fn test_cli_check_matches_library() {
    let report = falconhw_cli::check("sign", 256).unwrap();
    let program = emit("sign", 256).unwrap();
    assert!(report.contains(&format!("instructions: {}", program.len())));
    assert!(report.contains(&program.digest_hex()));
}

#[test]
fn test_sign_and_verify_differ() {
    let sign = emit("sign", 512).unwrap();
    let verify = emit("verify", 512).unwrap();
    assert_ne!(sign.digest(), verify.digest());
    assert!(sign.to_systemverilog().starts_with("localparam int SIGN_INSTRUCTION_COUNT = 4619;"));
}
