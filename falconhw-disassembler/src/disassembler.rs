//! Listing output

use crate::decoder::decode;
use crate::formatter::format;
use falconhw_spec::Program;
use std::fmt::Write;

/// Disassemble a program into a listing with a header, indices and raw words
pub fn disassemble(program: &Program) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "; Falcon accelerator program: {}, n = {}", program.kind, program.degree);
    let _ = writeln!(output, "; {} instructions", program.len());
    let _ = writeln!(output, "; sha256 {}", program.digest_hex());
    output.push('\n');
    output.push_str(&disassemble_words(&program.code));
    output
}

/// List raw words without a program header
///
/// Words that fail to decode are listed with the error in place of the
/// instruction text.
pub fn disassemble_words(words: &[u128]) -> String {
    let mut output = String::with_capacity(words.len() * 80);
    for (index, &word) in words.iter().enumerate() {
        let _ = write!(output, "{:04}  {:032x}  ", index, word);
        match decode(word) {
            Ok(inst) => output.push_str(&format(&inst)),
            Err(e) => {
                let _ = write!(output, "; ERROR: {}", e);
            }
        }
        output.push('\n');
    }
    output
}
