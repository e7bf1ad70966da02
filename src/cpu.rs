//! Component F: the step engine, and the [`Cpu`] that owns all
//! architectural state (Component E).
//!
//! `Cpu::step` is the only place architectural state is mutated: it
//! fetches the word at `pc`, decodes it, dispatches to the handler for
//! its resolved [`Operation`], applies the handler's effect, forces
//! register 0 back to zero, and reports whether the machine has halted.

use log::{debug, error, trace};
use thiserror::Error;

use crate::decode::Instruction;
use crate::format::{DecodeError, Operation};
use crate::memory::{Memory, MemoryError};
use crate::registers::{RegisterError, RegisterFile};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    #[error("instruction fetch failed: {0}")]
    Fetch(#[from] MemoryError),
    #[error("decode failed at pc {pc:#x}: {source}")]
    Decode { pc: u32, source: DecodeError },
    #[error("register access failed: {0}")]
    Register(#[from] RegisterError),
    #[error("data access failed: {0}")]
    Memory(MemoryError),
    #[error("operation {op:?} is decoded but not implemented by this model")]
    Unimplemented { op: Operation },
}

#[derive(Debug)]
pub struct Cpu {
    pub registers: RegisterFile,
    pub pc: u32,
    pub halted: bool,
    pub instruction_memory: Memory,
    pub data_memory: Memory,
}

impl Cpu {
    pub fn new(mem_size: usize) -> Self {
        Self {
            registers: RegisterFile::default(),
            pc: 0,
            halted: false,
            instruction_memory: Memory::new(mem_size),
            data_memory: Memory::new(mem_size),
        }
    }

    fn fetch(&self) -> Result<u32, StepError> {
        self.instruction_memory
            .read_u32(self.pc)
            .map_err(StepError::from)
    }

    /// Advance exactly one instruction. Returns `Ok(true)` once halted
    /// (including when called again after a previous halt), `Ok(false)`
    /// after an ordinary step, and `Err` on any fatal condition.
    pub fn step(&mut self) -> Result<bool, StepError> {
        if self.halted {
            return Ok(true);
        }

        let pc = self.pc;
        let raw = self.fetch()?;
        debug!("fetch pc={pc:#x} word={raw:#010x}");

        let instr = Instruction::decode(raw).map_err(|source| {
            error!("decode error at pc={pc:#x} word={raw:#010x}: {source}");
            StepError::Decode { pc, source }
        })?;
        trace!("decode pc={pc:#x} op={:?} format={:?}", instr.op, instr.format);

        self.execute(&instr).map_err(|err| {
            if let StepError::Unimplemented { op } = err {
                error!("unimplemented operation {op:?} at pc={pc:#x}");
            }
            err
        })?;
        self.registers.zero_x0();

        Ok(self.halted)
    }

    fn x(&self, index: u8) -> Result<u32, StepError> {
        Ok(self.registers.read(index)?)
    }

    fn set_x(&mut self, index: u8, value: u32) -> Result<(), StepError> {
        Ok(self.registers.write(index, value)?)
    }

    fn execute(&mut self, instr: &Instruction) -> Result<(), StepError> {
        use Operation::*;

        match instr.op {
            Lui => {
                self.set_x(instr.rd, instr.imm as u32)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Auipc => {
                self.set_x(instr.rd, self.pc.wrapping_add(instr.imm as u32))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Jal => {
                let link = self.pc.wrapping_add(4);
                self.set_x(instr.rd, link)?;
                self.pc = self.pc.wrapping_add(instr.imm as u32);
            }
            Jalr => {
                let base = self.x(instr.rs1)?;
                let target = base.wrapping_add(instr.imm as u32) & !1u32;
                let link = self.pc.wrapping_add(4);
                self.set_x(instr.rd, link)?;
                self.pc = target;
            }
            Beq | Bne | Blt | Bge | Bltu | Bgeu => {
                let a = self.x(instr.rs1)?;
                let b = self.x(instr.rs2)?;
                let taken = match instr.op {
                    Beq => a == b,
                    Bne => a != b,
                    Blt => (a as i32) < (b as i32),
                    Bge => (a as i32) >= (b as i32),
                    Bltu => a < b,
                    Bgeu => a >= b,
                    _ => unreachable!(),
                };
                self.pc = if taken {
                    self.pc.wrapping_add(instr.imm as u32)
                } else {
                    self.pc.wrapping_add(4)
                };
            }
            Lb => {
                let addr = self.effective_address(instr)?;
                let byte = self.data_memory.read_byte(addr).map_err(StepError::Memory)?;
                self.set_x(instr.rd, sign_extend_byte(byte))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Lh => {
                let addr = self.effective_address(instr)?;
                let half = self.data_memory.read_u16(addr).map_err(StepError::Memory)?;
                self.set_x(instr.rd, sign_extend_half(half))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Lw => {
                let addr = self.effective_address(instr)?;
                let word = self.data_memory.read_u32(addr).map_err(StepError::Memory)?;
                self.set_x(instr.rd, word)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Lbu => {
                let addr = self.effective_address(instr)?;
                let byte = self.data_memory.read_byte(addr).map_err(StepError::Memory)?;
                self.set_x(instr.rd, u32::from(byte))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Lhu => {
                let addr = self.effective_address(instr)?;
                let half = self.data_memory.read_u16(addr).map_err(StepError::Memory)?;
                self.set_x(instr.rd, u32::from(half))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Sb => {
                let addr = self.effective_address(instr)?;
                let value = self.x(instr.rs2)? as u8;
                self.data_memory
                    .write_byte(addr, value)
                    .map_err(StepError::Memory)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Sh => {
                let addr = self.effective_address(instr)?;
                let value = self.x(instr.rs2)? as u16;
                self.data_memory
                    .write_u16(addr, value)
                    .map_err(StepError::Memory)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Sw => {
                let addr = self.effective_address(instr)?;
                let value = self.x(instr.rs2)?;
                self.data_memory
                    .write_u32(addr, value)
                    .map_err(StepError::Memory)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Addi => {
                let a = self.x(instr.rs1)?;
                self.set_x(instr.rd, a.wrapping_add(instr.imm as u32))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Slti => {
                let a = self.x(instr.rs1)? as i32;
                self.set_x(instr.rd, u32::from(a < instr.imm))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Sltiu => {
                let a = self.x(instr.rs1)?;
                self.set_x(instr.rd, u32::from(a < instr.imm as u32))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Xori => {
                let a = self.x(instr.rs1)?;
                self.set_x(instr.rd, a ^ instr.imm as u32)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Ori => {
                let a = self.x(instr.rs1)?;
                self.set_x(instr.rd, a | instr.imm as u32)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Andi => {
                let a = self.x(instr.rs1)?;
                self.set_x(instr.rd, a & instr.imm as u32)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Slli => {
                let a = self.x(instr.rs1)?;
                self.set_x(instr.rd, a << (instr.shamt & 0x1f))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Srli => {
                let a = self.x(instr.rs1)?;
                self.set_x(instr.rd, a >> (instr.shamt & 0x1f))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Srai => {
                let a = self.x(instr.rs1)? as i32;
                self.set_x(instr.rd, (a >> (instr.shamt & 0x1f)) as u32)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Add => {
                let (a, b) = (self.x(instr.rs1)?, self.x(instr.rs2)?);
                self.set_x(instr.rd, a.wrapping_add(b))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Sub => {
                let (a, b) = (self.x(instr.rs1)?, self.x(instr.rs2)?);
                self.set_x(instr.rd, a.wrapping_sub(b))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Sll => {
                let (a, b) = (self.x(instr.rs1)?, self.x(instr.rs2)?);
                self.set_x(instr.rd, a << (b & 0x1f))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Slt => {
                let (a, b) = (self.x(instr.rs1)? as i32, self.x(instr.rs2)? as i32);
                self.set_x(instr.rd, u32::from(a < b))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Sltu => {
                let (a, b) = (self.x(instr.rs1)?, self.x(instr.rs2)?);
                self.set_x(instr.rd, u32::from(a < b))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Xor => {
                let (a, b) = (self.x(instr.rs1)?, self.x(instr.rs2)?);
                self.set_x(instr.rd, a ^ b)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Srl => {
                let (a, b) = (self.x(instr.rs1)?, self.x(instr.rs2)?);
                self.set_x(instr.rd, a >> (b & 0x1f))?;
                self.pc = self.pc.wrapping_add(4);
            }
            Sra => {
                let (a, b) = (self.x(instr.rs1)? as i32, self.x(instr.rs2)?);
                self.set_x(instr.rd, (a >> (b & 0x1f)) as u32)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Or => {
                let (a, b) = (self.x(instr.rs1)?, self.x(instr.rs2)?);
                self.set_x(instr.rd, a | b)?;
                self.pc = self.pc.wrapping_add(4);
            }
            And => {
                let (a, b) = (self.x(instr.rs1)?, self.x(instr.rs2)?);
                self.set_x(instr.rd, a & b)?;
                self.pc = self.pc.wrapping_add(4);
            }
            Ecall | Ebreak => {
                self.halted = true;
            }
            Csrrw | Csrrs | Csrrc | Csrrwi | Csrrsi | Csrrci => {
                return Err(StepError::Unimplemented { op: instr.op });
            }
        }
        Ok(())
    }

    fn effective_address(&self, instr: &Instruction) -> Result<u32, StepError> {
        let base = self.x(instr.rs1)?;
        Ok(base.wrapping_add(instr.imm as u32))
    }
}

fn sign_extend_byte(value: u8) -> u32 {
    value as i8 as i32 as u32
}

fn sign_extend_half(value: u16) -> u32 {
    value as i16 as i32 as u32
}
