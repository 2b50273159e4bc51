#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
  /// Stops the machine.
  ///
  /// | Operation | Semantics/RTL      | Encoding   |
  /// |-----------|--------------------|------------|
  /// | Halt      | `(stop execution)` | `00000001` |
  Halt = 0x01,

  /// Returns from a subroutine.
  ///
  /// | Operation | Semantics/RTL                    | Encoding   |
  /// |-----------|----------------------------------|------------|
  /// | Return    | `pc ← m[r[7]]; r[7] ← r[7] + 1`  | `00010001` |
  Return = 0x11,

  /// Pushes a register onto the stack.
  ///
  /// | Operation | Semantics/RTL                    | Encoding            |
  /// |-----------|----------------------------------|---------------------|
  /// | Push      | `r[7] ← r[7] − 1; m[r[7]] ← r[a]` | `01000101 00000aaa` |
  Push = 0x45,

  /// Pops the top of the stack into a register.
  ///
  /// | Operation | Semantics/RTL                    | Encoding            |
  /// |-----------|----------------------------------|---------------------|
  /// | Pop       | `r[a] ← m[r[7]]; r[7] ← r[7] + 1` | `01000110 00000aaa` |
  Pop = 0x46,

  /// Prints a register as a decimal number followed by a newline.
  ///
  /// | Operation | Semantics/RTL   | Encoding            |
  /// |-----------|-----------------|---------------------|
  /// | Print     | `out ← r[a]`    | `01000111 00000aaa` |
  Print = 0x47,

  /// Calls the subroutine whose address is held in a register.
  ///
  /// | Operation | Semantics/RTL                                   | Encoding            |
  /// |-----------|-------------------------------------------------|---------------------|
  /// | Call      | `r[7] ← r[7] − 1; m[r[7]] ← pc + 2; pc ← r[a]`  | `01010000 00000aaa` |
  Call = 0x50,

  /// Jumps to the address held in a register.
  ///
  /// | Operation | Semantics/RTL | Encoding            |
  /// |-----------|---------------|---------------------|
  /// | Jump      | `pc ← r[a]`   | `01010100 00000aaa` |
  Jump = 0x54,

  /// | Operation   | Semantics/RTL          | Encoding            |
  /// |-------------|------------------------|---------------------|
  /// | JumpIfEqual | `if E : pc ← r[a]`     | `01010101 00000aaa` |
  JumpIfEqual = 0x55,

  /// | Operation      | Semantics/RTL       | Encoding            |
  /// |----------------|---------------------|---------------------|
  /// | JumpIfNotEqual | `if !E : pc ← r[a]` | `01010110 00000aaa` |
  JumpIfNotEqual = 0x56,

  /// Loads an immediate value into a register.
  ///
  /// | Operation      | Semantics/RTL     | Encoding                     |
  /// |----------------|-------------------|------------------------------|
  /// | Load Immediate | `r[a] ← vvvvvvvv` | `10000010 00000aaa vvvvvvvv` |
  LoadImmediate = 0x82,

  /// | Operation | Semantics/RTL        | Encoding                     |
  /// |-----------|----------------------|------------------------------|
  /// | Add       | `r[a] ← r[a] + r[b]` | `10100000 00000aaa 00000bbb` |
  Add = 0xA0,

  /// | Operation | Semantics/RTL        | Encoding                     |
  /// |-----------|----------------------|------------------------------|
  /// | Multiply  | `r[a] ← r[a] × r[b]` | `10100010 00000aaa 00000bbb` |
  Multiply = 0xA2,

  /// Compares two registers, setting exactly one of the `E`, `L` and `G`
  /// flags.
  ///
  /// | Operation | Semantics/RTL            | Encoding                     |
  /// |-----------|--------------------------|------------------------------|
  /// | Compare   | `ELG ← cmp(r[a], r[b])`  | `10100111 00000aaa 00000bbb` |
  Compare = 0xA7,
}

/// A byte that does not name any instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOpcode(pub u8);

impl TryFrom<u8> for Opcode {
  type Error = UnknownOpcode;

  fn try_from(byte: u8) -> Result<Self, Self::Error> {
    match byte {
      0x01 => Ok(Self::Halt),
      0x11 => Ok(Self::Return),
      0x45 => Ok(Self::Push),
      0x46 => Ok(Self::Pop),
      0x47 => Ok(Self::Print),
      0x50 => Ok(Self::Call),
      0x54 => Ok(Self::Jump),
      0x55 => Ok(Self::JumpIfEqual),
      0x56 => Ok(Self::JumpIfNotEqual),
      0x82 => Ok(Self::LoadImmediate),
      0xA0 => Ok(Self::Add),
      0xA2 => Ok(Self::Multiply),
      0xA7 => Ok(Self::Compare),
      other => Err(UnknownOpcode(other)),
    }
  }
}

impl Opcode {
  /// Number of operand bytes following the opcode.
  ///
  /// The top two bits of every opcode encode this count.
  pub fn operands(self) -> usize {
    (self as u8 >> 6) as usize
  }

  /// Full instruction length in bytes, opcode included
  pub fn size(self) -> usize {
    self.operands() + 1
  }

  pub fn mnemonic(self) -> &'static str {
    match self {
      Self::Halt => "HLT",
      Self::Return => "RET",
      Self::Push => "PUSH",
      Self::Pop => "POP",
      Self::Print => "PRN",
      Self::Call => "CALL",
      Self::Jump => "JMP",
      Self::JumpIfEqual => "JEQ",
      Self::JumpIfNotEqual => "JNE",
      Self::LoadImmediate => "LDI",
      Self::Add => "ADD",
      Self::Multiply => "MUL",
      Self::Compare => "CMP",
    }
  }
}
