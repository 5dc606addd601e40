//! CPU emulation for the LS-8.
//!
//! This module implements the complete LS-8 architecture:
//! - 256 bytes of RAM shared by program and stack
//! - 8 general-purpose registers, R7 doubling as the stack pointer
//! - a flags register written by CMP
//! - a 13-instruction set of 1 to 3 byte instructions

pub mod memory;
pub mod registers;
pub mod alu;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Flags, Registers};
pub use alu::AluOp;
pub use decode::{Instruction, Opcode, DecodeError};
pub use execute::{Cpu, CpuError, CpuState};
