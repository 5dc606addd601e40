//! LS-8 CPU registers.
//!
//! The LS-8 has:
//! - R0-R7: eight 8-bit general-purpose registers
//! - R7 doubles as the stack pointer (SP)
//! - PC: the program counter
//! - FL: the flags register, written only by CMP

use serde::{Serialize, Deserialize};

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// Index of the register used as the stack pointer.
pub const SP: usize = 7;

/// The condition-code register.
///
/// Exactly one of `EQUAL`, `GREATER` or `LESS` is set after a compare;
/// before the first compare no bit is set.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags(u8);

impl Flags {
    pub const EQUAL: u8 = 0b0000_0001;
    pub const GREATER: u8 = 0b0000_0010;
    pub const LESS: u8 = 0b0000_0100;

    /// No flag set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Flags describing how `a` relates to `b`.
    pub fn compare(a: u8, b: u8) -> Self {
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Self(Self::GREATER),
            std::cmp::Ordering::Less => Self(Self::LESS),
            std::cmp::Ordering::Equal => Self(Self::EQUAL),
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_equal(self) -> bool {
        self.0 & Self::EQUAL != 0
    }

    pub const fn is_greater(self) -> bool {
        self.0 & Self::GREATER != 0
    }

    pub const fn is_less(self) -> bool {
        self.0 & Self::LESS != 0
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = if self.is_equal() {
            "E"
        } else if self.is_greater() {
            "G"
        } else if self.is_less() {
            "L"
        } else {
            "-"
        };
        write!(f, "FL={:08b} ({})", self.0, name)
    }
}

/// The LS-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// General-purpose registers R0-R7.
    pub gp: [u8; NUM_REGISTERS],

    /// Program counter.
    pub pc: u8,

    /// Condition flags.
    pub fl: Flags,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            gp: [0; NUM_REGISTERS],
            pc: 0,
            fl: Flags::empty(),
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read a general-purpose register.
    ///
    /// Register operands are taken modulo 8, so any operand byte
    /// names a valid register.
    #[inline]
    pub fn get(&self, reg: u8) -> u8 {
        self.gp[reg as usize % NUM_REGISTERS]
    }

    /// Write a general-purpose register.
    #[inline]
    pub fn set(&mut self, reg: u8, value: u8) {
        self.gp[reg as usize % NUM_REGISTERS] = value;
    }

    /// Current stack pointer value.
    #[inline]
    pub fn sp(&self) -> u8 {
        self.gp[SP]
    }

    #[inline]
    pub fn set_sp(&mut self, value: u8) {
        self.gp[SP] = value;
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u8) {
        self.pc = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_compare() {
        assert_eq!(Flags::compare(5, 5).bits(), Flags::EQUAL);
        assert_eq!(Flags::compare(9, 2).bits(), Flags::GREATER);
        assert_eq!(Flags::compare(2, 9).bits(), Flags::LESS);
    }

    #[test]
    fn test_flags_single_bit() {
        for (a, b) in [(0, 0), (1, 0), (0, 1), (255, 254), (128, 128)] {
            assert_eq!(Flags::compare(a, b).bits().count_ones(), 1);
        }
        assert_eq!(Flags::empty().bits(), 0);
    }

    #[test]
    fn test_register_access() {
        let mut regs = Registers::new();
        regs.set(3, 200);
        assert_eq!(regs.get(3), 200);
        assert_eq!(regs.gp[3], 200);
    }

    #[test]
    fn test_register_index_wraps() {
        let mut regs = Registers::new();
        regs.set(9, 7);
        assert_eq!(regs.get(1), 7);
    }

    #[test]
    fn test_sp_is_r7() {
        let mut regs = Registers::new();
        regs.set_sp(0xF4);
        assert_eq!(regs.get(7), 0xF4);
        assert_eq!(regs.sp(), 0xF4);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers::new();
        regs.set(0, 1);
        regs.pc = 10;
        regs.fl = Flags::compare(1, 2);
        regs.reset();
        assert_eq!(regs, Registers::new());
    }
}
