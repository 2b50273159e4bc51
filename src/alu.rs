use std::cmp::Ordering;

use crate::vm::Register;

/// The operations routed through the arithmetic-logic unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
  Add,
  Mul,
  Cmp,
}

/// Comparison flags, written only by `CMP` and read by the conditional jumps.
///
/// At most one flag is ever set: each comparison clears all three before
/// setting the one that matches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
  pub equal: bool,
  pub less: bool,
  pub greater: bool,
}

impl Flags {
  fn compare(a: Register, b: Register) -> Self {
    match a.cmp(&b) {
      Ordering::Less => Self {
        less: true,
        ..Self::default()
      },
      Ordering::Greater => Self {
        greater: true,
        ..Self::default()
      },
      Ordering::Equal => Self {
        equal: true,
        ..Self::default()
      },
    }
  }
}

/// Applies `op` to the register pair `(a, b)` in place.
///
/// Arithmetic wraps at the byte boundary. Indices must already be validated.
pub fn execute(op: AluOp, registers: &mut [Register], flags: &mut Flags, a: usize, b: usize) {
  let rb = registers[b];
  match op {
    // r[a] ← r[a] + r[b]
    AluOp::Add => registers[a] = registers[a].wrapping_add(rb),
    // r[a] ← r[a] × r[b]
    AluOp::Mul => registers[a] = registers[a].wrapping_mul(rb),
    AluOp::Cmp => *flags = Flags::compare(registers[a], rb),
  }
}
