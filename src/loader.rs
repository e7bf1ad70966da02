//! Hex-text program/data loading and register/memory dumping.
//!
//! Not part of the core step engine (see [`crate::cpu`]); this module is
//! the external collaborator that populates memory before a run and
//! reads it back afterward, in the plain one-word-per-line hex format
//! the reference C model reads and writes.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::cpu::Cpu;
use crate::memory::Memory;

pub const DEFAULT_PROGRAM_FILE: &str = "code.txt";
pub const DEFAULT_DATA_FILE: &str = "data.txt";
pub const DEFAULT_DATA_DUMP_FILE: &str = "data_out.txt";
pub const DEFAULT_REGS_DUMP_FILE: &str = "regs_out.txt";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line} of {path} is not a valid hexadecimal word: {text:?}")]
    MalformedLine {
        path: String,
        line: usize,
        text: String,
    },
    #[error("{path} contains more data than the {size}-byte memory can hold")]
    TooLarge { path: String, size: usize },
}

/// Parse one line of the hex-text format: an optional `0x`/`0X` prefix
/// followed by hexadecimal digits.
fn parse_word(line: &str) -> Option<u32> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u32::from_str_radix(digits, 16).ok()
}

/// Load a hex-text file into `memory`, one little-endian 32-bit word per
/// line starting at address 0.
fn load_into(path: &Path, memory: &mut Memory) -> Result<(), LoaderError> {
    let path_str = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|source| LoaderError::Read {
        path: path_str.clone(),
        source,
    })?;

    let mut address: u32 = 0;
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let word = parse_word(line).ok_or_else(|| LoaderError::MalformedLine {
            path: path_str.clone(),
            line: line_no + 1,
            text: line.to_string(),
        })?;
        if address as usize + 4 > memory.len() {
            return Err(LoaderError::TooLarge {
                path: path_str.clone(),
                size: memory.len(),
            });
        }
        memory
            .write_u32(address, word)
            .expect("bounds already checked above");
        address += 4;
    }
    debug!("loaded {address} bytes from {path_str}");
    Ok(())
}

/// Write every 4-byte-aligned word of `memory` to `path`, zero-padded hex,
/// one per line, in ascending address order.
fn dump_words(path: &Path, words: impl Iterator<Item = u32>) -> Result<(), LoaderError> {
    let path_str = path.display().to_string();
    let mut file = fs::File::create(path).map_err(|source| LoaderError::Write {
        path: path_str.clone(),
        source,
    })?;
    let mut count = 0usize;
    for word in words {
        writeln!(file, "0x{word:08x}").map_err(|source| LoaderError::Write {
            path: path_str.clone(),
            source,
        })?;
        count += 1;
    }
    info!("dumped {count} words to {path_str}");
    Ok(())
}

pub fn load_program(cpu: &mut Cpu, path: impl AsRef<Path>) -> Result<(), LoaderError> {
    load_into(path.as_ref(), &mut cpu.instruction_memory)
}

pub fn load_data(cpu: &mut Cpu, path: impl AsRef<Path>) -> Result<(), LoaderError> {
    load_into(path.as_ref(), &mut cpu.data_memory)
}

pub fn dump_data(cpu: &Cpu, path: impl AsRef<Path>) -> Result<(), LoaderError> {
    dump_words(path.as_ref(), cpu.data_memory.words())
}

/// Dump all 32 registers, one per line, x0 through x31.
pub fn dump_regs(cpu: &Cpu, path: impl AsRef<Path>) -> Result<(), LoaderError> {
    let values: Vec<u32> = (0..32u8)
        .map(|n| cpu.registers.read(n).expect("register index always in range"))
        .collect();
    dump_words(path.as_ref(), values.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_prefix() {
        assert_eq!(parse_word("0x1A"), Some(0x1a));
        assert_eq!(parse_word("1A"), Some(0x1a));
        assert_eq!(parse_word("   0x2b  "), Some(0x2b));
    }

    #[test]
    fn malformed_line_is_rejected() {
        assert_eq!(parse_word("not hex"), None);
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_word(""), None);
        assert_eq!(parse_word("   "), None);
    }
}
