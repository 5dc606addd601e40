//! LS-8 Emulator - CLI Entry Point
//!
//! `ls8 <program>` runs a program until it halts. Exit status:
//! 0 halted, 1 unknown instruction, 2 unreadable file, 3 malformed
//! program, 4 address out of range, 5 cycle limit reached, 74 output
//! or terminal I/O failure.

use clap::Parser;
use ls8::{Cpu, CpuError, ProgramFile};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "ls8")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the LS-8 8-bit computer")]
struct Cli {
    /// Path to the program file to execute
    program: PathBuf,
    /// Print a trace line to stderr before every instruction
    #[arg(short, long)]
    trace: bool,
    /// Stop with an error after this many instructions
    #[arg(short, long)]
    max_cycles: Option<u64>,
    /// Write the final machine state as JSON to this file
    #[arg(long, value_name = "PATH")]
    dump_state: Option<PathBuf>,
    /// Open the interactive debugger instead of running
    #[cfg(feature = "tui")]
    #[arg(short, long)]
    debug: bool,
}

/// Exit status when `--max-cycles` is exhausted.
const EXIT_CYCLE_LIMIT: i32 = 5;

/// Exit status for failed output or terminal I/O.
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
const EXIT_IO_ERROR: i32 = 74;

fn main() {
    let cli = Cli::parse();

    let program = match ls8::load_program(&cli.program) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(e.exit_code());
        }
    };

    #[cfg(feature = "tui")]
    {
        if cli.debug {
            debug_program(program.bytes);
            return;
        }
    }

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&program.bytes) {
        eprintln!("❌ Failed to load program: {}", e);
        process::exit(3);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = run_program(&mut cpu, &mut out, cli.trace, cli.max_cycles);
    let result = result.and_then(|()| flush_output(&mut out));

    if let Some(path) = &cli.dump_state {
        dump_state(&cpu, path);
    }

    match result {
        Ok(()) if cpu.is_halted() => {}
        Ok(()) => {
            eprintln!(
                "❌ Reached max cycles limit ({}) at PC={}",
                cpu.cycles, cpu.regs.pc
            );
            process::exit(EXIT_CYCLE_LIMIT);
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            report_source_line(&program, &cpu, &e);
            process::exit(e.exit_code());
        }
    }
}

/// Point a runtime fault back at the program file line it came from.
fn report_source_line(program: &ProgramFile, cpu: &Cpu, error: &CpuError) {
    let pc = match error {
        CpuError::Decode { pc, .. } => *pc,
        _ => cpu.regs.pc,
    };
    if let Some(line) = program.source_line(pc) {
        eprintln!("   at line {} (address {})", line, pc);
    }
}

fn flush_output<W: Write>(out: &mut W) -> Result<(), CpuError> {
    out.flush().map_err(|e| CpuError::Output(e.to_string()))
}

fn run_program<W: Write>(
    cpu: &mut Cpu,
    out: &mut W,
    trace: bool,
    max_cycles: Option<u64>,
) -> Result<(), CpuError> {
    let limit = max_cycles.unwrap_or(u64::MAX);

    if !trace {
        cpu.run_limited(limit, out)?;
        return Ok(());
    }

    while cpu.is_running() && cpu.cycles < limit {
        let line = cpu.trace_line();
        match cpu.fetch() {
            Ok(instr) => eprintln!("{} | {}", line, instr),
            Err(_) => eprintln!("{}", line),
        }
        cpu.step(out)?;
    }

    Ok(())
}

fn dump_state(cpu: &Cpu, path: &Path) {
    let written = serde_json::to_string_pretty(cpu)
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));

    if let Err(e) = written {
        eprintln!("⚠️  Failed to write state to {}: {}", path.display(), e);
    }
}

#[cfg(feature = "tui")]
fn debug_program(program: Vec<u8>) {
    if program.is_empty() {
        eprintln!("❌ No instructions to execute");
        process::exit(3);
    }

    if let Err(e) = ls8::run_debugger(program) {
        eprintln!("❌ Debugger error: {}", e);
        process::exit(EXIT_IO_ERROR);
    }
}
