//! Instruction classification and operation resolution.
//!
//! [`Format`] maps an opcode to one of the six RV32I instruction layouts.
//! [`Operation`] is the closed set of mnemonics this model understands;
//! [`resolve`] selects one from the decoded opcode/funct3/funct7 fields.

use thiserror::Error;

/// One of the six RV32I instruction-word layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    U,
    J,
    R,
    I,
    S,
    B,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("opcode {0:#09b} does not match any RV32I instruction format")]
    UnknownOpcode(u32),
    #[error("opcode {opcode:#09b} funct3 {funct3:#05b} has no defined operation")]
    UnknownFunct3 { opcode: u32, funct3: u32 },
    #[error("opcode {opcode:#09b} funct3 {funct3:#05b} funct7 {funct7:#09b} has no defined operation")]
    UnknownFunct7 {
        opcode: u32,
        funct3: u32,
        funct7: u32,
    },
    #[error("JALR requires funct3 = 0, found {0:#05b}")]
    InvalidJalrFunct3(u32),
    #[error("SYSTEM instruction with funct3 = 0 and imm {0:#x} is neither ECALL nor EBREAK")]
    InvalidSystemImmediate(i32),
}

/// The closed set of RV32I operations, plus the seven Zicsr mnemonics that
/// this model recognizes at decode time but never executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Operation {
    Lui,
    Auipc,
    Jal,
    Jalr,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Sb,
    Sh,
    Sw,
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Ecall,
    Ebreak,
    Csrrw,
    Csrrs,
    Csrrc,
    Csrrwi,
    Csrrsi,
    Csrrci,
}

impl Operation {
    /// True for the six CSR-manipulating mnemonics, which this model
    /// decodes but refuses to execute (see [`crate::cpu::StepError::Unimplemented`]).
    pub fn is_unimplemented(self) -> bool {
        matches!(
            self,
            Operation::Csrrw
                | Operation::Csrrs
                | Operation::Csrrc
                | Operation::Csrrwi
                | Operation::Csrrsi
                | Operation::Csrrci
        )
    }
}

const OPCODE_LUI: u32 = 0b0110111;
const OPCODE_AUIPC: u32 = 0b0010111;
const OPCODE_JAL: u32 = 0b1101111;
const OPCODE_JALR: u32 = 0b1100111;
const OPCODE_BRANCH: u32 = 0b1100011;
const OPCODE_LOAD: u32 = 0b0000011;
const OPCODE_STORE: u32 = 0b0100011;
const OPCODE_OP_IMM: u32 = 0b0010011;
const OPCODE_OP: u32 = 0b0110011;
const OPCODE_SYSTEM: u32 = 0b1110011;

/// Map an opcode to its instruction format, per the RV32I classifier table.
pub fn classify(opcode: u32) -> Result<Format, DecodeError> {
    match opcode {
        OPCODE_LUI | OPCODE_AUIPC => Ok(Format::U),
        OPCODE_JAL => Ok(Format::J),
        OPCODE_JALR | OPCODE_LOAD | OPCODE_OP_IMM | OPCODE_SYSTEM => Ok(Format::I),
        OPCODE_STORE => Ok(Format::S),
        OPCODE_BRANCH => Ok(Format::B),
        OPCODE_OP => Ok(Format::R),
        other => Err(DecodeError::UnknownOpcode(other)),
    }
}

/// Select the operation mnemonic for a decoded instruction. `imm` is only
/// consulted for SYSTEM opcodes (to distinguish ECALL from EBREAK).
pub fn resolve(
    opcode: u32,
    funct3: u32,
    funct7: u32,
    imm: i32,
) -> Result<Operation, DecodeError> {
    match opcode {
        OPCODE_LUI => Ok(Operation::Lui),
        OPCODE_AUIPC => Ok(Operation::Auipc),
        OPCODE_JAL => Ok(Operation::Jal),
        OPCODE_JALR => {
            if funct3 == 0b000 {
                Ok(Operation::Jalr)
            } else {
                Err(DecodeError::InvalidJalrFunct3(funct3))
            }
        }
        OPCODE_BRANCH => match funct3 {
            0b000 => Ok(Operation::Beq),
            0b001 => Ok(Operation::Bne),
            0b100 => Ok(Operation::Blt),
            0b101 => Ok(Operation::Bge),
            0b110 => Ok(Operation::Bltu),
            0b111 => Ok(Operation::Bgeu),
            other => Err(DecodeError::UnknownFunct3 {
                opcode,
                funct3: other,
            }),
        },
        OPCODE_LOAD => match funct3 {
            0b000 => Ok(Operation::Lb),
            0b001 => Ok(Operation::Lh),
            0b010 => Ok(Operation::Lw),
            0b100 => Ok(Operation::Lbu),
            0b101 => Ok(Operation::Lhu),
            other => Err(DecodeError::UnknownFunct3 {
                opcode,
                funct3: other,
            }),
        },
        OPCODE_STORE => match funct3 {
            0b000 => Ok(Operation::Sb),
            0b001 => Ok(Operation::Sh),
            0b010 => Ok(Operation::Sw),
            other => Err(DecodeError::UnknownFunct3 {
                opcode,
                funct3: other,
            }),
        },
        OPCODE_OP_IMM => match funct3 {
            0b000 => Ok(Operation::Addi),
            0b010 => Ok(Operation::Slti),
            0b011 => Ok(Operation::Sltiu),
            0b100 => Ok(Operation::Xori),
            0b110 => Ok(Operation::Ori),
            0b111 => Ok(Operation::Andi),
            0b001 => Ok(Operation::Slli),
            0b101 => match funct7 {
                0b0000000 => Ok(Operation::Srli),
                0b0100000 => Ok(Operation::Srai),
                other => Err(DecodeError::UnknownFunct7 {
                    opcode,
                    funct3,
                    funct7: other,
                }),
            },
            other => Err(DecodeError::UnknownFunct3 {
                opcode,
                funct3: other,
            }),
        },
        OPCODE_OP => match funct3 {
            0b000 => match funct7 {
                0b0000000 => Ok(Operation::Add),
                0b0100000 => Ok(Operation::Sub),
                other => Err(DecodeError::UnknownFunct7 {
                    opcode,
                    funct3,
                    funct7: other,
                }),
            },
            0b001 => Ok(Operation::Sll),
            0b010 => Ok(Operation::Slt),
            0b011 => Ok(Operation::Sltu),
            0b100 => Ok(Operation::Xor),
            0b101 => match funct7 {
                0b0000000 => Ok(Operation::Srl),
                0b0100000 => Ok(Operation::Sra),
                other => Err(DecodeError::UnknownFunct7 {
                    opcode,
                    funct3,
                    funct7: other,
                }),
            },
            0b110 => Ok(Operation::Or),
            0b111 => Ok(Operation::And),
            other => Err(DecodeError::UnknownFunct3 {
                opcode,
                funct3: other,
            }),
        },
        OPCODE_SYSTEM => match funct3 {
            0b000 => match imm {
                0 => Ok(Operation::Ecall),
                1 => Ok(Operation::Ebreak),
                other => Err(DecodeError::InvalidSystemImmediate(other)),
            },
            0b001 => Ok(Operation::Csrrw),
            0b010 => Ok(Operation::Csrrs),
            0b011 => Ok(Operation::Csrrc),
            0b101 => Ok(Operation::Csrrwi),
            0b110 => Ok(Operation::Csrrsi),
            0b111 => Ok(Operation::Csrrci),
            other => Err(DecodeError::UnknownFunct3 {
                opcode,
                funct3: other,
            }),
        },
        other => Err(DecodeError::UnknownOpcode(other)),
    }
}
