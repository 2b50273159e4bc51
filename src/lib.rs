//! Bare-bones emulator for the LS-8, a tiny 8-bit von-Neumann machine
//!
//! 256 bytes of memory, eight byte registers (r7 doubles as the stack
//! pointer) and a handful of opcodes: enough to run little programs that
//! load, multiply, print, push, call and compare.

pub mod alu;
pub mod image;
pub mod opcode;
pub mod vm;
