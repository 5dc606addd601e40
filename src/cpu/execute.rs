//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::{alu, Memory, Registers};
use crate::cpu::decode::{self, DecodeError, Instruction};
use crate::cpu::memory::{MemoryError, MEMORY_SIZE};
use serde::{Serialize, Deserialize};
use std::io::Write;
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed HLT instruction).
    Halted,
    /// CPU encountered a fatal error.
    Error,
}

/// Where PC goes after an instruction.
enum Next {
    /// Fall through to the following instruction.
    Advance,
    /// Absolute jump.
    Jump(u8),
    /// Leave PC where it is.
    Stay,
}

/// The LS-8 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Load a program into memory at address 0.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)
    }

    /// Execute a single instruction, sending PRN output to `out`.
    ///
    /// Returns the instruction that was executed. Any error is fatal:
    /// the CPU moves to [`CpuState::Error`] and refuses further steps.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        match self.fetch().and_then(|instr| self.execute(instr, out).map(|_| instr)) {
            Ok(instr) => {
                self.cycles += 1;
                self.last_instr = Some(instr);
                Ok(instr)
            }
            Err(e) => {
                self.state = CpuState::Error;
                Err(e)
            }
        }
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<W: Write>(&mut self, max_cycles: u64, out: &mut W) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycles < limit {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Decode the instruction at PC without executing it.
    pub fn fetch(&self) -> Result<Instruction, CpuError> {
        let pc = self.regs.pc as usize;
        let end = (pc + 3).min(MEMORY_SIZE);
        decode::decode(&self.mem.as_slice()[pc..end])
            .map_err(|source| CpuError::Decode { pc: self.regs.pc, source })
    }

    /// Execute a decoded instruction.
    ///
    /// Every fallible check runs before the first write, so a failing
    /// instruction leaves registers and memory untouched.
    fn execute<W: Write>(&mut self, instr: Instruction, out: &mut W) -> Result<(), CpuError> {
        let next = match instr {
            // ==================== Control ====================

            Instruction::Hlt => {
                self.state = CpuState::Halted;
                Next::Stay
            }

            Instruction::Jmp { reg } => Next::Jump(self.regs.get(reg)),

            Instruction::Jeq { reg } => {
                if self.regs.fl.is_equal() {
                    Next::Jump(self.regs.get(reg))
                } else {
                    Next::Advance
                }
            }

            Instruction::Jne { reg } => {
                if !self.regs.fl.is_equal() {
                    Next::Jump(self.regs.get(reg))
                } else {
                    Next::Advance
                }
            }

            Instruction::Call { reg } => {
                let ret = self.fall_through(instr)?;
                self.push(ret)?;
                // Read after the push: CALL R7 jumps to the new SP.
                Next::Jump(self.regs.get(reg))
            }

            Instruction::Ret => Next::Jump(self.pop()?),

            // ==================== Data Transfer ====================

            Instruction::Ldi { reg, value } => {
                self.check_fall_through(instr)?;
                self.regs.set(reg, value);
                Next::Advance
            }

            Instruction::Prn { reg } => {
                self.check_fall_through(instr)?;
                writeln!(out, "{}", self.regs.get(reg))
                    .map_err(|e| CpuError::Output(e.to_string()))?;
                Next::Advance
            }

            Instruction::Push { reg } => {
                self.check_fall_through(instr)?;
                self.push(self.regs.get(reg))?;
                Next::Advance
            }

            Instruction::Pop { reg } => {
                self.check_fall_through(instr)?;
                let value = self.top_of_stack()?;
                self.regs.set(reg, value);
                // Increment whatever R7 now holds, so POP R7 yields value + 1.
                self.regs.set_sp(self.regs.sp().wrapping_add(1));
                Next::Advance
            }

            // ==================== Arithmetic ====================

            Instruction::Alu { op, reg_a, reg_b } => {
                self.check_fall_through(instr)?;
                alu::execute(op, &mut self.regs, reg_a, reg_b);
                Next::Advance
            }
        };

        match next {
            Next::Advance => self.regs.pc = self.fall_through(instr)?,
            Next::Jump(addr) => self.regs.jump(addr),
            Next::Stay => {}
        }

        Ok(())
    }

    /// Address of the instruction following `instr`.
    fn fall_through(&self, instr: Instruction) -> Result<u8, CpuError> {
        let next = self.regs.pc as usize + instr.size();
        u8::try_from(next).map_err(|_| CpuError::PcOutOfRange(next))
    }

    fn check_fall_through(&self, instr: Instruction) -> Result<(), CpuError> {
        self.fall_through(instr).map(|_| ())
    }

    /// Decrement SP and store `value` at the new top of stack.
    fn push(&mut self, value: u8) -> Result<(), CpuError> {
        let sp = self.regs.sp().checked_sub(1).ok_or(CpuError::StackOverflow)?;
        self.mem.write(sp as usize, value)?;
        self.regs.set_sp(sp);
        Ok(())
    }

    /// Value at SP, provided a pop would leave SP inside memory.
    fn top_of_stack(&self) -> Result<u8, CpuError> {
        let sp = self.regs.sp();
        if sp == u8::MAX {
            return Err(CpuError::StackUnderflow);
        }
        Ok(self.mem.read(sp as usize)?)
    }

    /// Load the top of stack and increment SP.
    fn pop(&mut self) -> Result<u8, CpuError> {
        let value = self.top_of_stack()?;
        self.regs.set_sp(self.regs.sp() + 1);
        Ok(value)
    }

    /// One-line machine snapshot: PC, the three bytes at PC, then R0-R7.
    pub fn trace_line(&self) -> String {
        let pc = self.regs.pc as usize;
        let byte = |offset: usize| self.mem.read(pc + offset).unwrap_or(0);

        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            pc,
            byte(0),
            byte(1),
            byte(2)
        );
        for value in self.regs.gp {
            line.push_str(&format!(" {:02X}", value));
        }
        line
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("at PC={pc}: {source}")]
    Decode { pc: u8, source: DecodeError },

    #[error("stack overflow: SP would drop below address 0")]
    StackOverflow,

    #[error("stack underflow: SP would rise above address 255")]
    StackUnderflow,

    #[error("program counter out of range: {0}")]
    PcOutOfRange(usize),

    #[error("output error: {0}")]
    Output(String),
}

impl CpuError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CpuError::Decode { source: DecodeError::InvalidOpcode(_), .. } => 1,
            CpuError::Decode { source: DecodeError::Truncated { .. }, .. }
            | CpuError::MemoryError(_)
            | CpuError::StackOverflow
            | CpuError::StackUnderflow
            | CpuError::PcOutOfRange(_) => 4,
            CpuError::Output(_) => 74,
            CpuError::NotRunning(_) => 70,
        }
    }
}
