//! Instruction word decoder

use crate::error::Result;
use falconhw_spec::Instruction;

/// Decode one 128-bit instruction word
pub fn decode(word: u128) -> Result<Instruction> {
    Ok(Instruction::decode(word)?)
}

/// Decode a whole word list, stopping at the first invalid word
pub fn decode_all(words: &[u128]) -> Result<Vec<Instruction>> {
    words.iter().map(|&w| decode(w)).collect()
}
