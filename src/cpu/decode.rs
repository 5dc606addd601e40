//! Instruction decoder for the LS-8.
//!
//! An instruction is one opcode byte followed by up to two operand
//! bytes. The opcode's two high bits hold the operand count, so the
//! length of every instruction is known from its first byte.

use crate::cpu::alu::AluOp;
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// Decoded LS-8 instruction.
///
/// Register operands are raw operand bytes; the register file maps
/// them onto R0-R7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Control ====================

    /// Stop the machine.
    Hlt,

    /// Unconditional jump: PC := R[reg]
    Jmp { reg: u8 },

    /// Jump if the equal flag is set.
    Jeq { reg: u8 },

    /// Jump if the equal flag is clear.
    Jne { reg: u8 },

    /// Push the return address, then PC := R[reg]
    Call { reg: u8 },

    /// Pop the return address into PC.
    Ret,

    // ==================== Data Transfer ====================

    /// Load immediate: R[reg] := value
    Ldi { reg: u8, value: u8 },

    /// Print R[reg] in decimal.
    Prn { reg: u8 },

    /// Push R[reg] onto the stack.
    Push { reg: u8 },

    /// Pop the top of the stack into R[reg].
    Pop { reg: u8 },

    // ==================== Arithmetic ====================

    /// Two-register ALU operation (ADD, MUL, CMP).
    Alu { op: AluOp, reg_a: u8, reg_b: u8 },
}

/// Opcode byte values.
pub struct Opcode;

impl Opcode {
    pub const HLT: u8 = 0b0000_0001;
    pub const RET: u8 = 0b0001_0001;
    pub const PUSH: u8 = 0b0100_0101;
    pub const POP: u8 = 0b0100_0110;
    pub const PRN: u8 = 0b0100_0111;
    pub const CALL: u8 = 0b0101_0000;
    pub const JMP: u8 = 0b0101_0100;
    pub const JEQ: u8 = 0b0101_0101;
    pub const JNE: u8 = 0b0101_0110;
    pub const LDI: u8 = 0b1000_0010;
    pub const ADD: u8 = 0b1010_0000;
    pub const MUL: u8 = 0b1010_0010;
    pub const CMP: u8 = 0b1010_0111;

    /// Total length in bytes of the instruction starting with `opcode`.
    pub const fn size(opcode: u8) -> usize {
        1 + (opcode >> 6) as usize
    }
}

impl Instruction {
    /// Opcode byte of this instruction.
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Hlt => Opcode::HLT,
            Instruction::Jmp { .. } => Opcode::JMP,
            Instruction::Jeq { .. } => Opcode::JEQ,
            Instruction::Jne { .. } => Opcode::JNE,
            Instruction::Call { .. } => Opcode::CALL,
            Instruction::Ret => Opcode::RET,
            Instruction::Ldi { .. } => Opcode::LDI,
            Instruction::Prn { .. } => Opcode::PRN,
            Instruction::Push { .. } => Opcode::PUSH,
            Instruction::Pop { .. } => Opcode::POP,
            Instruction::Alu { op: AluOp::Add, .. } => Opcode::ADD,
            Instruction::Alu { op: AluOp::Mul, .. } => Opcode::MUL,
            Instruction::Alu { op: AluOp::Cmp, .. } => Opcode::CMP,
        }
    }

    /// Encoded length in bytes, opcode included.
    pub fn size(&self) -> usize {
        Opcode::size(self.opcode())
    }

    /// Encode back to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode()];
        match *self {
            Instruction::Hlt | Instruction::Ret => {}
            Instruction::Jmp { reg }
            | Instruction::Jeq { reg }
            | Instruction::Jne { reg }
            | Instruction::Call { reg }
            | Instruction::Prn { reg }
            | Instruction::Push { reg }
            | Instruction::Pop { reg } => bytes.push(reg),
            Instruction::Ldi { reg, value } => bytes.extend([reg, value]),
            Instruction::Alu { reg_a, reg_b, .. } => bytes.extend([reg_a, reg_b]),
        }
        bytes
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Hlt => write!(f, "HLT"),
            Instruction::Ret => write!(f, "RET"),
            Instruction::Jmp { reg } => write!(f, "JMP R{}", reg),
            Instruction::Jeq { reg } => write!(f, "JEQ R{}", reg),
            Instruction::Jne { reg } => write!(f, "JNE R{}", reg),
            Instruction::Call { reg } => write!(f, "CALL R{}", reg),
            Instruction::Prn { reg } => write!(f, "PRN R{}", reg),
            Instruction::Push { reg } => write!(f, "PUSH R{}", reg),
            Instruction::Pop { reg } => write!(f, "POP R{}", reg),
            Instruction::Ldi { reg, value } => write!(f, "LDI R{},{}", reg, value),
            Instruction::Alu { op, reg_a, reg_b } => {
                write!(f, "{} R{},R{}", op.mnemonic(), reg_a, reg_b)
            }
        }
    }
}

/// Decode the instruction whose opcode is `bytes[0]`.
///
/// Bytes past the instruction's length are ignored. An unknown opcode
/// is reported before a short slice.
pub fn decode(bytes: &[u8]) -> Result<Instruction, DecodeError> {
    let opcode = *bytes.first().ok_or(DecodeError::Truncated { opcode: 0, needed: 1 })?;
    let operand = |i: usize| {
        bytes.get(i).copied().ok_or(DecodeError::Truncated {
            opcode,
            needed: Opcode::size(opcode),
        })
    };

    let instruction = match opcode {
        Opcode::HLT => Instruction::Hlt,
        Opcode::RET => Instruction::Ret,
        Opcode::PRN => Instruction::Prn { reg: operand(1)? },
        Opcode::PUSH => Instruction::Push { reg: operand(1)? },
        Opcode::POP => Instruction::Pop { reg: operand(1)? },
        Opcode::CALL => Instruction::Call { reg: operand(1)? },
        Opcode::JMP => Instruction::Jmp { reg: operand(1)? },
        Opcode::JEQ => Instruction::Jeq { reg: operand(1)? },
        Opcode::JNE => Instruction::Jne { reg: operand(1)? },
        Opcode::LDI => Instruction::Ldi { reg: operand(1)?, value: operand(2)? },
        Opcode::ADD => alu(AluOp::Add, operand(1)?, operand(2)?),
        Opcode::MUL => alu(AluOp::Mul, operand(1)?, operand(2)?),
        Opcode::CMP => alu(AluOp::Cmp, operand(1)?, operand(2)?),
        _ => return Err(DecodeError::InvalidOpcode(opcode)),
    };

    Ok(instruction)
}

fn alu(op: AluOp, reg_a: u8, reg_b: u8) -> Instruction {
    Instruction::Alu { op, reg_a, reg_b }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown instruction: {0}, {0:#b}")]
    InvalidOpcode(u8),

    #[error("instruction {opcode:#010b} needs {needed} bytes")]
    Truncated { opcode: u8, needed: usize },
}
