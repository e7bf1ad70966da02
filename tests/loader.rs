//! Loader/dumper round trips through the real filesystem, exercising the
//! hex-text format boundary that the in-memory unit tests don't cross.

use std::fs;
use std::path::PathBuf;

use rv32i_cmodel::cpu::Cpu;
use rv32i_cmodel::loader::{self, LoaderError};

/// A path under the system temp directory, unique to this test process
/// and removed when dropped.
struct ScratchFile(PathBuf);

impl ScratchFile {
    fn new(name: &str) -> Self {
        let mut path = std::env::temp_dir();
        path.push(format!("rv32i_cmodel_{name}_{}", std::process::id()));
        Self(path)
    }

    fn write(&self, contents: &str) {
        fs::write(&self.0, contents).unwrap();
    }

    fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

#[test]
fn load_program_populates_instruction_memory_in_order() {
    let file = ScratchFile::new("program");
    file.write("0x00500093\n0x00000073\n");

    let mut cpu = Cpu::new(64);
    loader::load_program(&mut cpu, file.path()).unwrap();

    assert_eq!(cpu.instruction_memory.read_u32(0).unwrap(), 0x0050_0093);
    assert_eq!(cpu.instruction_memory.read_u32(4).unwrap(), 0x0000_0073);
}

#[test]
fn load_data_accepts_values_without_0x_prefix() {
    let file = ScratchFile::new("data_noprefix");
    file.write("deadbeef\n");

    let mut cpu = Cpu::new(64);
    loader::load_data(&mut cpu, file.path()).unwrap();

    assert_eq!(cpu.data_memory.read_u32(0).unwrap(), 0xdead_beef);
}

#[test]
fn load_skips_blank_lines_without_shifting_addresses() {
    let file = ScratchFile::new("program_blank");
    file.write("0x1\n\n0x2\n");

    let mut cpu = Cpu::new(64);
    loader::load_program(&mut cpu, file.path()).unwrap();

    assert_eq!(cpu.instruction_memory.read_u32(0).unwrap(), 1);
    assert_eq!(cpu.instruction_memory.read_u32(4).unwrap(), 2);
}

#[test]
fn load_rejects_input_larger_than_configured_memory() {
    let file = ScratchFile::new("program_oversize");
    file.write("0x1\n0x2\n0x3\n0x4\n0x5\n");

    let mut cpu = Cpu::new(16);
    let result = loader::load_program(&mut cpu, file.path());
    assert!(matches!(result, Err(LoaderError::TooLarge { .. })));
}

#[test]
fn load_rejects_malformed_hex_with_the_line_number() {
    let file = ScratchFile::new("program_malformed");
    file.write("0x1\nnot hex\n");

    let mut cpu = Cpu::new(64);
    let result = loader::load_program(&mut cpu, file.path());
    match result {
        Err(LoaderError::MalformedLine { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected a malformed-line error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_a_read_error() {
    let mut cpu = Cpu::new(64);
    let result = loader::load_program(&mut cpu, "/nonexistent/path/for/rv32i_cmodel_tests");
    assert!(matches!(result, Err(LoaderError::Read { .. })));
}

#[test]
fn dump_regs_writes_32_zero_padded_lines() {
    let mut cpu = Cpu::new(64);
    cpu.registers.write(1, 5).unwrap();

    let file = ScratchFile::new("regs_out");
    loader::dump_regs(&cpu, file.path()).unwrap();

    let contents = fs::read_to_string(file.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 32);
    assert_eq!(lines[0], "0x00000000");
    assert_eq!(lines[1], "0x00000005");
}

#[test]
fn dump_data_round_trips_through_load_data() {
    let mut cpu = Cpu::new(64);
    cpu.data_memory.write_u32(0, 0xcafe_babe).unwrap();
    cpu.data_memory.write_u32(4, 0x0000_002a).unwrap();

    let dump = ScratchFile::new("data_out");
    loader::dump_data(&cpu, dump.path()).unwrap();

    let mut reloaded = Cpu::new(64);
    loader::load_data(&mut reloaded, dump.path()).unwrap();
    assert_eq!(reloaded.data_memory.read_u32(0).unwrap(), 0xcafe_babe);
    assert_eq!(reloaded.data_memory.read_u32(4).unwrap(), 0x0000_002a);
}
