//! Component D: the decoded instruction value.
//!
//! [`Instruction`] aggregates every field [`crate::bits`] can extract from a
//! raw word, plus the format and operation resolved by [`crate::format`].
//! Decoding a word is a pure function of the word; nothing here touches
//! architectural state.

use crate::bits;
use crate::format::{self, DecodeError, Format, Operation};

#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub raw: u32,
    pub format: Format,
    pub op: Operation,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub funct3: u8,
    pub funct7: u8,
    pub shamt: u8,
    /// Sign-extended immediate. Meaningless for `Format::R`, where no
    /// immediate field exists.
    pub imm: i32,
}

impl Instruction {
    pub fn decode(raw: u32) -> Result<Self, DecodeError> {
        let opcode = bits::opcode(raw);
        let format = format::classify(opcode)?;
        let funct3 = bits::funct3(raw);
        let funct7 = bits::funct7(raw);

        let imm = match format {
            Format::U => bits::imm_u(raw),
            Format::J => bits::imm_j(raw),
            Format::I => bits::imm_i(raw),
            Format::S => bits::imm_s(raw),
            Format::B => bits::imm_b(raw),
            Format::R => 0,
        };

        let op = format::resolve(opcode, funct3, funct7, imm)?;

        Ok(Instruction {
            raw,
            format,
            op,
            rd: bits::rd(raw) as u8,
            rs1: bits::rs1(raw) as u8,
            rs2: bits::rs2(raw) as u8,
            funct3: funct3 as u8,
            funct7: funct7 as u8,
            shamt: bits::shamt(raw) as u8,
            imm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_addi_x1_x0_5() {
        let instr = Instruction::decode(0x0050_0093).unwrap();
        assert_eq!(instr.op, Operation::Addi);
        assert_eq!(instr.rd, 1);
        assert_eq!(instr.rs1, 0);
        assert_eq!(instr.imm, 5);
    }

    #[test]
    fn decodes_lui_high_immediate() {
        // lui x2, 0x12345 -> 0x12345137
        let instr = Instruction::decode(0x1234_5137).unwrap();
        assert_eq!(instr.op, Operation::Lui);
        assert_eq!(instr.rd, 2);
        assert_eq!(instr.imm, 0x1234_5000u32 as i32);
    }

    #[test]
    fn decode_is_a_pure_function_of_the_word() {
        let w = 0x67810113u32;
        let a = Instruction::decode(w).unwrap();
        let b = Instruction::decode(w).unwrap();
        assert_eq!(a.op, b.op);
        assert_eq!(a.imm, b.imm);
        assert_eq!(a.rd, b.rd);
    }

    #[test]
    fn invalid_opcode_is_a_decode_error() {
        assert!(Instruction::decode(0xffff_ffff).is_err());
    }

    #[test]
    fn r_type_instruction_has_no_meaningful_immediate_but_full_fields() {
        // add x1, x2, x3
        let w = (3 << 20) | (2 << 15) | (1 << 7) | 0b0110011;
        let instr = Instruction::decode(w).unwrap();
        assert_eq!(instr.op, Operation::Add);
        assert_eq!(instr.rd, 1);
        assert_eq!(instr.rs1, 2);
        assert_eq!(instr.rs2, 3);
    }
}
