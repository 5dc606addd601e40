//! # LS-8 Emulator
//!
//! An emulator of the LS-8, a minimal 8-bit computer with 256 bytes of
//! RAM, eight registers, a hardware stack and a 13-instruction set.
//!
//! Programs are text files holding one binary byte per line; the
//! [`loader`] turns them into bytes and the [`Cpu`] runs them.

pub mod cpu;
pub mod loader;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, Registers, Flags, Instruction};
pub use loader::{load_program, parse_program, LoadError, ProgramFile};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
