//! Command-line entry point: load a program and data image, run the
//! model to completion (or a step limit), then dump data memory and
//! registers. Mirrors the reference C model's `cpu.cpp`: construct,
//! load, step until halted, dump.

use std::process::ExitCode;

use clap::Parser;
use clap_num::maybe_hex;
use log::{error, info};

use rv32i_cmodel::cpu::Cpu;
use rv32i_cmodel::loader::{
    self, DEFAULT_DATA_DUMP_FILE, DEFAULT_DATA_FILE, DEFAULT_PROGRAM_FILE, DEFAULT_REGS_DUMP_FILE,
};

/// RV32I functional model: run a hex-text program against a hex-text
/// data image and dump the resulting state.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Instruction memory source, one hex word per line.
    #[arg(long, default_value = DEFAULT_PROGRAM_FILE)]
    program: String,

    /// Data memory source, one hex word per line.
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    data: String,

    /// Destination for the final data-memory dump.
    #[arg(long, default_value = DEFAULT_DATA_DUMP_FILE)]
    dump_data: String,

    /// Destination for the final register dump.
    #[arg(long, default_value = DEFAULT_REGS_DUMP_FILE)]
    dump_regs: String,

    /// Shared byte size of instruction and data memory. Accepts decimal
    /// or 0x-prefixed hexadecimal.
    #[arg(long, value_parser=maybe_hex::<usize>, default_value = "4000")]
    memory_size: usize,

    /// Stop after this many steps even if the program has not halted.
    #[arg(long)]
    max_steps: Option<u64>,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(args: Args) -> Result<(), String> {
    let mut cpu = Cpu::new(args.memory_size);

    loader::load_program(&mut cpu, &args.program).map_err(|e| e.to_string())?;
    loader::load_data(&mut cpu, &args.data).map_err(|e| e.to_string())?;

    let mut steps: u64 = 0;
    loop {
        if let Some(limit) = args.max_steps {
            if steps >= limit {
                info!("stopped after reaching max-steps={limit}");
                break;
            }
        }
        let halted = cpu.step().map_err(|e| e.to_string())?;
        steps += 1;
        if halted {
            info!("halted after {steps} step(s)");
            break;
        }
    }

    loader::dump_data(&cpu, &args.dump_data).map_err(|e| e.to_string())?;
    loader::dump_regs(&cpu, &args.dump_regs).map_err(|e| e.to_string())?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}
