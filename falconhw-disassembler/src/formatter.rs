//! Instruction formatting
//!
//! One clause per active unit, joined by ` | `, in module-table order:
//!
//! ```text
//! split b5@0x000 -> b0@0x300 x2^7
//! hash_to_point b6 -> b5 | ntt b0@0x000 -> b2@0x000 | decompress b1 -> b4, b3
//! samplerz b1@0x004, tree b6@0x001.hi -> b2 seed
//! ```

use falconhw_spec::{BankSlot, Instruction, Unit};

/// Format an instruction as listing text
pub fn format(inst: &Instruction) -> String {
    if inst.modules.is_empty() {
        return "nop".to_string();
    }
    inst.modules
        .units()
        .map(|unit| format_unit(inst, unit))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn format_unit(inst: &Instruction, unit: Unit) -> String {
    let a1 = inst.address1;
    let a2 = inst.address2;
    let rows = scale(inst);
    match unit {
        Unit::BramRead => "bram_read".to_string(),
        Unit::BramWrite => "bram_write".to_string(),
        Unit::Copy => format!(
            "copy {} -> {}{}",
            at(inst, BankSlot::Bank3, a1),
            at(inst, BankSlot::Bank4, a2),
            rows
        ),
        Unit::HashToPoint => format!(
            "hash_to_point {} -> {}",
            bank(inst, BankSlot::Bank3),
            bank(inst, BankSlot::Bank4)
        ),
        Unit::Decompress => format!(
            "decompress {} -> {}, b{}",
            bank(inst, BankSlot::Bank5),
            bank(inst, BankSlot::Bank6),
            inst.decompress_output2
        ),
        Unit::NttIntt | Unit::FftIfft => {
            let name = match (unit, inst.mode) {
                (Unit::NttIntt, false) => "ntt",
                (Unit::NttIntt, true) => "intt",
                (_, false) => "fft",
                (_, true) => "ifft",
            };
            format!(
                "{} {} -> {}",
                name,
                at(inst, BankSlot::Bank1, a1),
                at(inst, BankSlot::Bank2, a2)
            )
        }
        Unit::Compress => format!(
            "compress {} -> {}",
            at(inst, BankSlot::Bank1, a1),
            at(inst, BankSlot::Bank2, a2)
        ),
        Unit::IntToDouble | Unit::Split | Unit::Merge => format!(
            "{} {} -> {}{}",
            unit.name().to_ascii_lowercase(),
            at(inst, BankSlot::Bank1, a1),
            at(inst, BankSlot::Bank2, a2),
            rows
        ),
        Unit::ComplexMul => format!(
            "complex_mul {} *= {}{}",
            at(inst, BankSlot::Bank1, a1),
            at(inst, BankSlot::Bank2, a2),
            rows
        ),
        Unit::MulConst => format!(
            "mul_const {} -> {} *= c{}{}",
            at(inst, BankSlot::Bank3, a1),
            at(inst, BankSlot::Bank4, a1),
            inst.mul_const_sel as u8,
            rows
        ),
        Unit::ModMultQ => format!(
            "mod_mult_q {}, {} -> {}{}",
            bank(inst, BankSlot::Bank1),
            bank(inst, BankSlot::Bank2),
            bank(inst, BankSlot::Bank3),
            rows
        ),
        Unit::SubNormSq => format!(
            "sub_norm_sq {}, {}, {}{}",
            bank(inst, BankSlot::Bank1),
            bank(inst, BankSlot::Bank2),
            bank(inst, BankSlot::Bank3),
            rows
        ),
        Unit::AddSub => {
            let out = if inst.addr_same { a1 } else { a2 };
            format!(
                "{} {}, {} -> {}{}",
                if inst.add_sub { "sub" } else { "add" },
                at(inst, BankSlot::Bank1, a1),
                at(inst, BankSlot::Bank2, a2),
                at(inst, BankSlot::Bank3, out),
                rows
            )
        }
        Unit::SamplerZ => format!(
            "samplerz {}, tree {}.{} -> {}{}",
            at(inst, BankSlot::Bank1, a1),
            at(inst, BankSlot::Bank2, a2),
            if inst.add_sub { "hi" } else { "lo" },
            bank(inst, BankSlot::Bank3),
            if inst.mode { " seed" } else { "" }
        ),
    }
}

fn bank(inst: &Instruction, slot: BankSlot) -> String {
    format!("b{}", inst.banks[slot.index()])
}

fn at(inst: &Instruction, slot: BankSlot, addr: u16) -> String {
    format!("b{}@{:#05x}", inst.banks[slot.index()], addr)
}

fn scale(inst: &Instruction) -> String {
    if inst.element_count == 0 {
        String::new()
    } else {
        format!(" x2^{}", inst.element_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use falconhw_spec::Bank;

    #[test]
    fn test_format_split() {
        let inst = Instruction::unit(Unit::Split)
            .with_bank(BankSlot::Bank1, Bank::Bram5)
            .with_bank(BankSlot::Bank2, Bank::Bram0)
            .with_address2(0x300)
            .unwrap()
            .with_element_count(7)
            .unwrap();
        assert_eq!(format(&inst), "split b5@0x000 -> b0@0x300 x2^7");
    }

    #[test]
    fn test_format_nop() {
        assert_eq!(format(&Instruction::default()), "nop");
    }

    #[test]
    fn test_format_co_issue_order() {
        let inst = Instruction::unit(Unit::HashToPoint)
            .also(Unit::NttIntt)
            .with_bank(BankSlot::Bank1, Bank::Bram0)
            .with_bank(BankSlot::Bank2, Bank::Bram2)
            .with_bank(BankSlot::Bank3, Bank::Bram6)
            .with_bank(BankSlot::Bank4, Bank::Bram5);
        assert_eq!(
            format(&inst),
            "hash_to_point b6 -> b5 | ntt b0@0x000 -> b2@0x000"
        );
    }

    #[test]
    fn test_format_inverse_transforms() {
        let intt = Instruction::unit(Unit::NttIntt).with_mode(true);
        assert!(format(&intt).starts_with("intt "));
        let ifft = Instruction::unit(Unit::FftIfft).with_mode(true);
        assert!(format(&ifft).starts_with("ifft "));
    }

    #[test]
    fn test_format_add_sub_destination() {
        let inst = Instruction::unit(Unit::AddSub)
            .with_bank(BankSlot::Bank1, Bank::Bram1)
            .with_bank(BankSlot::Bank2, Bank::Bram0)
            .with_bank(BankSlot::Bank3, Bank::Bram1)
            .with_address1(4)
            .unwrap()
            .with_address2(9)
            .unwrap()
            .with_add_sub(true)
            .with_addr_same(true);
        assert_eq!(format(&inst), "sub b1@0x004, b0@0x009 -> b1@0x004");
    }

    #[test]
    fn test_format_sampler() {
        let inst = Instruction::unit(Unit::SamplerZ)
            .with_bank(BankSlot::Bank1, Bank::Bram1)
            .with_bank(BankSlot::Bank2, Bank::Bram6)
            .with_bank(BankSlot::Bank3, Bank::Bram2)
            .with_address1(4)
            .unwrap()
            .with_address2(1)
            .unwrap()
            .with_add_sub(true)
            .with_mode(true);
        assert_eq!(format(&inst), "samplerz b1@0x004, tree b6@0x001.hi -> b2 seed");
    }
}
