//! Component E (part 2): byte-addressable memory.
//!
//! Both instruction and data memory are instances of this type: a
//! fixed-size, zero-initialized byte buffer, little-endian for any
//! multi-byte access. Unlike the reference crate's sparse `HashMap`-backed
//! memory, this model uses a flat `Vec<u8>` of the configured size, since
//! the architecture this model targets has no sparse or paged address
//! space — only a single fixed-size region per memory.

use thiserror::Error;

/// Default byte size for a newly constructed memory, matching the
/// reference model's constructor default.
pub const DEFAULT_SIZE: usize = 4000;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("address {address:#x} with access width {width} exceeds memory size {size:#x}")]
    OutOfRange {
        address: u32,
        width: u8,
        size: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn check_range(&self, address: u32, width: u8) -> Result<(), MemoryError> {
        let end = address as usize + width as usize;
        if end > self.bytes.len() {
            Err(MemoryError::OutOfRange {
                address,
                width,
                size: self.bytes.len(),
            })
        } else {
            Ok(())
        }
    }

    pub fn read_byte(&self, address: u32) -> Result<u8, MemoryError> {
        self.check_range(address, 1)?;
        Ok(self.bytes[address as usize])
    }

    pub fn read_u16(&self, address: u32) -> Result<u16, MemoryError> {
        self.check_range(address, 2)?;
        let i = address as usize;
        Ok(u16::from_le_bytes([self.bytes[i], self.bytes[i + 1]]))
    }

    pub fn read_u32(&self, address: u32) -> Result<u32, MemoryError> {
        self.check_range(address, 4)?;
        let i = address as usize;
        Ok(u32::from_le_bytes([
            self.bytes[i],
            self.bytes[i + 1],
            self.bytes[i + 2],
            self.bytes[i + 3],
        ]))
    }

    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<(), MemoryError> {
        self.check_range(address, 1)?;
        self.bytes[address as usize] = value;
        Ok(())
    }

    pub fn write_u16(&mut self, address: u32, value: u16) -> Result<(), MemoryError> {
        self.check_range(address, 2)?;
        let i = address as usize;
        self.bytes[i..i + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn write_u32(&mut self, address: u32, value: u32) -> Result<(), MemoryError> {
        self.check_range(address, 4)?;
        let i = address as usize;
        self.bytes[i..i + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Every 4-byte-aligned word in the memory, in ascending address
    /// order. Used by the register/data dumpers in [`crate::loader`].
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.bytes.len())
            .step_by(4)
            .map(move |addr| self.read_u32(addr as u32).unwrap_or(0))
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_is_zero_initialized() {
        let mem = Memory::default();
        assert_eq!(mem.read_byte(0).unwrap(), 0);
        assert_eq!(mem.read_u32(0).unwrap(), 0);
    }

    #[test]
    fn byte_write_then_read_round_trips() {
        let mut mem = Memory::new(16);
        mem.write_byte(3, 0x42).unwrap();
        assert_eq!(mem.read_byte(3).unwrap(), 0x42);
        assert_eq!(mem.read_byte(4).unwrap(), 0);
    }

    #[test]
    fn word_write_is_little_endian() {
        let mut mem = Memory::new(16);
        mem.write_u32(0, 0xdead_beef).unwrap();
        assert_eq!(mem.read_byte(0).unwrap(), 0xef);
        assert_eq!(mem.read_byte(1).unwrap(), 0xbe);
        assert_eq!(mem.read_byte(2).unwrap(), 0xad);
        assert_eq!(mem.read_byte(3).unwrap(), 0xde);
        assert_eq!(mem.read_u32(0).unwrap(), 0xdead_beef);
    }

    #[test]
    fn halfword_and_word_round_trip() {
        let mut mem = Memory::new(16);
        mem.write_u16(4, 0x1234).unwrap();
        assert_eq!(mem.read_u16(4).unwrap(), 0x1234);
    }

    #[test]
    fn out_of_range_access_is_an_error() {
        let mem = Memory::new(8);
        assert!(mem.read_u32(6).is_err());
        assert!(mem.read_byte(8).is_err());
        assert!(mem.read_byte(7).is_ok());
    }

    #[test]
    fn out_of_range_write_is_an_error_and_does_not_panic() {
        let mut mem = Memory::new(4);
        assert!(mem.write_u32(1, 0xffff_ffff).is_err());
    }

    #[test]
    fn words_iterates_every_aligned_slot() {
        let mut mem = Memory::new(8);
        mem.write_u32(0, 1).unwrap();
        mem.write_u32(4, 2).unwrap();
        let words: Vec<u32> = mem.words().collect();
        assert_eq!(words, vec![1, 2]);
    }
}
