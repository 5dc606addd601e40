//! Arithmetic logic unit.
//!
//! Every ALU operation reads two registers; ADD and MUL write the
//! wrapped 8-bit result back into the first, CMP writes the flags.
//! [`AluOp`] is closed, so there is no "unsupported operation" path.

use crate::cpu::registers::{Flags, Registers};
use serde::{Serialize, Deserialize};

/// An operation the ALU knows how to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Mul,
    Cmp,
}

impl AluOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Mul => "MUL",
            AluOp::Cmp => "CMP",
        }
    }
}

/// Apply `op` to registers `reg_a` and `reg_b`.
pub fn execute(op: AluOp, regs: &mut Registers, reg_a: u8, reg_b: u8) {
    let a = regs.get(reg_a);
    let b = regs.get(reg_b);

    match op {
        AluOp::Add => regs.set(reg_a, a.wrapping_add(b)),
        AluOp::Mul => regs.set(reg_a, a.wrapping_mul(b)),
        AluOp::Cmp => regs.fl = Flags::compare(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs_with(a: u8, b: u8) -> Registers {
        let mut regs = Registers::new();
        regs.set(0, a);
        regs.set(1, b);
        regs
    }

    #[test]
    fn test_add_wraps() {
        let mut regs = regs_with(250, 10);
        execute(AluOp::Add, &mut regs, 0, 1);
        assert_eq!(regs.get(0), 4);
        assert_eq!(regs.get(1), 10);
    }

    #[test]
    fn test_mul_wraps() {
        let mut regs = regs_with(16, 17);
        execute(AluOp::Mul, &mut regs, 0, 1);
        assert_eq!(regs.get(0), (16 * 17 % 256) as u8);
    }

    #[test]
    fn test_add_same_register() {
        let mut regs = regs_with(100, 0);
        execute(AluOp::Add, &mut regs, 0, 0);
        assert_eq!(regs.get(0), 200);
    }

    #[test]
    fn test_cmp_replaces_flags() {
        let mut regs = regs_with(5, 5);
        execute(AluOp::Cmp, &mut regs, 0, 1);
        assert!(regs.fl.is_equal());

        regs.set(0, 9);
        regs.set(1, 2);
        execute(AluOp::Cmp, &mut regs, 0, 1);
        assert_eq!(regs.fl.bits(), Flags::GREATER);

        regs.set(0, 1);
        execute(AluOp::Cmp, &mut regs, 0, 1);
        assert_eq!(regs.fl.bits(), Flags::LESS);
    }

    #[test]
    fn test_cmp_leaves_registers() {
        let mut regs = regs_with(3, 4);
        execute(AluOp::Cmp, &mut regs, 0, 1);
        assert_eq!((regs.get(0), regs.get(1)), (3, 4));
    }
}
