use std::io::{self, Write};

use crate::alu::{self, AluOp, Flags};
use crate::image::Image;
use crate::opcode::{Opcode, UnknownOpcode};

/// The type of a single register in our virtual machine
pub type Register = u8;

/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 256;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Index of the register used as the stack pointer
pub const SP: usize = 7;

/// Initial stack pointer, the stack grows down from here
pub const STACK_TOP: Register = 0xF4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  Running,
  Halted,
  Faulted,
}

/// A virtual machine for the LS-8.
///
/// Every register and memory cell is a byte, and arithmetic wraps around at
/// 256. Out of range accesses never wrap though: any instruction that would
/// touch memory past the last cell, name a register that does not exist, or
/// move the stack pointer out of the byte range faults the machine instead.
/// That includes popping the cell at `0xFF`: an empty stack at 256 does not
/// fit in r7, so the pop faults with a stack underflow.
#[derive(Debug)]
pub struct Vm {
  // address of the next instruction to fetch
  pc: usize,
  memory: [u8; MEMORY_SIZE],
  registers: [Register; REGISTER_COUNT],
  flags: Flags,
  state: State,
}

impl Vm {
  /// Create a new, empty virtual machine
  pub fn new() -> Self {
    let mut registers = [0; REGISTER_COUNT];
    registers[SP] = STACK_TOP;
    Self {
      pc: 0,
      memory: [0; MEMORY_SIZE],
      registers,
      flags: Flags::default(),
      state: State::Running,
    }
  }

  /// Create a new virtual machine with `image` loaded at address 0
  pub fn with_program<I>(image: &I) -> Result<Self, Error>
  where
    I: Image + ?Sized,
  {
    let mut vm = Self::new();
    vm.load(image)?;
    Ok(vm)
  }

  /// Copy `image` into memory, starting at address 0
  pub fn load<I>(&mut self, image: &I) -> Result<(), Error>
  where
    I: Image + ?Sized,
  {
    let bytes = image.bytes();
    let target = self
      .memory
      .get_mut(..bytes.len())
      .ok_or(Error::ImageTooLarge { len: bytes.len() })?;
    target.copy_from_slice(bytes);
    tracing::debug!(len = bytes.len(), "loaded image into memory");
    Ok(())
  }

  /// Step through a single instruction, writing anything it prints to `out`.
  ///
  /// A failing instruction faults the machine; it will not step again.
  pub fn step<W>(&mut self, out: &mut W) -> Result<(), Error>
  where
    W: io::Write,
  {
    if self.state != State::Running {
      return Err(Error::MachineHalted);
    }
    tracing::trace!("{}", self.trace());
    let mut task = Task::new(self, out);
    let result = task.run();
    if let Err(err) = &result {
      tracing::warn!(pc = self.pc, %err, "machine fault");
      self.state = State::Faulted;
    }
    result
  }

  /// Step until the machine halts or faults
  pub fn run<W>(&mut self, out: &mut W) -> Result<(), Error>
  where
    W: io::Write,
  {
    while self.state == State::Running {
      self.step(out)?;
    }
    Ok(())
  }

  pub fn read(&self, address: usize) -> Result<u8, Error> {
    self
      .memory
      .get(address)
      .copied()
      .ok_or(Error::AddressFault { address })
  }

  pub fn write(&mut self, address: usize, value: u8) -> Result<(), Error> {
    let cell = self
      .memory
      .get_mut(address)
      .ok_or(Error::AddressFault { address })?;
    *cell = value;
    Ok(())
  }

  pub fn pc(&self) -> usize {
    self.pc
  }

  pub fn register(&self, index: usize) -> Option<Register> {
    self.registers.get(index).copied()
  }

  pub fn registers(&self) -> &[Register; REGISTER_COUNT] {
    &self.registers
  }

  pub fn sp(&self) -> Register {
    self.registers[SP]
  }

  pub fn flags(&self) -> Flags {
    self.flags
  }

  pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
    &self.memory
  }

  pub fn state(&self) -> State {
    self.state
  }

  pub fn is_running(&self) -> bool {
    self.state == State::Running
  }

  /// A one line dump of the machine: `pc`, the three bytes at `pc`, then every
  /// register, all in hex. Bytes past the end of memory print as `--`.
  pub fn trace(&self) -> String {
    let byte = |offset: usize| {
      self
        .memory
        .get(self.pc + offset)
        .map_or_else(|| "--".to_owned(), |b| format!("{b:02X}"))
    };
    let registers: Vec<String> = self.registers.iter().map(|r| format!("{r:02X}")).collect();
    format!(
      "TRACE: {:02X} | {} {} {} | {}",
      self.pc,
      byte(0),
      byte(1),
      byte(2),
      registers.join(" ")
    )
  }
}

impl Default for Vm {
  fn default() -> Self {
    Self::new()
  }
}

/// An error that occurred during execution of instructions
#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("unknown opcode {opcode:#04X} at address {pc:#04X}")]
  UnknownOpcode { opcode: u8, pc: usize },

  #[error("no such register r{register} (instruction at {pc:#04X})")]
  InvalidRegister { register: u8, pc: usize },

  #[error("address {address:#04X} is outside of memory")]
  AddressFault { address: usize },

  #[error("stack overflow at {pc:#04X}")]
  StackOverflow { pc: usize },

  #[error("stack underflow at {pc:#04X}")]
  StackUnderflow { pc: usize },

  #[error("image of {len} bytes does not fit in memory")]
  ImageTooLarge { len: usize },

  #[error("machine is halted")]
  MachineHalted,

  #[error("failed to write output")]
  Output(#[from] io::Error),
}

struct Task<'vm, 'out, W> {
  vm: &'vm mut Vm,
  out: &'out mut W,
  // address of the instruction being executed
  pc: usize,
}

impl<'vm, 'out, W> Task<'vm, 'out, W>
where
  W: io::Write,
{
  fn new(vm: &'vm mut Vm, out: &'out mut W) -> Self {
    let pc = vm.pc;
    Self { vm, out, pc }
  }

  #[inline]
  fn eat(&mut self) -> Result<u8, Error> {
    let byte = self.vm.read(self.vm.pc)?;
    self.vm.pc += 1;
    Ok(byte)
  }

  fn eat_register(&mut self) -> Result<usize, Error> {
    let register = self.eat()?;
    if register as usize >= REGISTER_COUNT {
      return Err(Error::InvalidRegister {
        register,
        pc: self.pc,
      });
    }
    Ok(register as usize)
  }

  // r[7] ← r[7] − 1, giving the new stack top
  fn grow_stack(&mut self) -> Result<usize, Error> {
    let sp = self.vm.registers[SP]
      .checked_sub(1)
      .ok_or(Error::StackOverflow { pc: self.pc })?;
    self.vm.registers[SP] = sp;
    Ok(sp as usize)
  }

  // r[7] ← r[7] + 1
  fn shrink_stack(&mut self) -> Result<(), Error> {
    self.vm.registers[SP] = self.vm.registers[SP]
      .checked_add(1)
      .ok_or(Error::StackUnderflow { pc: self.pc })?;
    Ok(())
  }

  // m[r[7]]
  fn top(&self) -> Result<u8, Error> {
    self.vm.read(self.vm.registers[SP] as usize)
  }

  fn run(&mut self) -> Result<(), Error> {
    // decode before consuming anything, so a bad opcode leaves pc on it
    let byte = self.vm.read(self.pc)?;
    let op = Opcode::try_from(byte)
      .map_err(|UnknownOpcode(opcode)| Error::UnknownOpcode { opcode, pc: self.pc })?;
    self.vm.pc += 1;
    tracing::trace!(pc = self.pc, op = op.mnemonic(), "execute");
    match op {
      Opcode::Halt => halt(self),
      Opcode::LoadImmediate => load_immediate(self)?,
      Opcode::Print => print(self)?,
      Opcode::Add => arithmetic(self, AluOp::Add)?,
      Opcode::Multiply => arithmetic(self, AluOp::Mul)?,
      Opcode::Compare => arithmetic(self, AluOp::Cmp)?,
      Opcode::Push => push(self)?,
      Opcode::Pop => pop(self)?,
      Opcode::Call => call(self)?,
      Opcode::Return => ret(self)?,
      Opcode::Jump => jump(self)?,
      Opcode::JumpIfEqual => jump_if(self, true)?,
      Opcode::JumpIfNotEqual => jump_if(self, false)?,
    }
    Ok(())
  }
}

// (stop execution)
fn halt<W>(task: &mut Task<'_, '_, W>)
where
  W: io::Write,
{
  task.vm.state = State::Halted;
  tracing::debug!(pc = task.pc, "halted");
}

// r[a] ← vvvvvvvv
fn load_immediate<W>(task: &mut Task<'_, '_, W>) -> Result<(), Error>
where
  W: io::Write,
{
  let a = task.eat_register()?;
  let value = task.eat()?;
  task.vm.registers[a] = value;
  Ok(())
}

// out ← r[a]
fn print<W>(task: &mut Task<'_, '_, W>) -> Result<(), Error>
where
  W: io::Write,
{
  let a = task.eat_register()?;
  writeln!(task.out, "{}", task.vm.registers[a])?;
  Ok(())
}

// r[a] ← r[a] op r[b]
fn arithmetic<W>(task: &mut Task<'_, '_, W>, op: AluOp) -> Result<(), Error>
where
  W: io::Write,
{
  let a = task.eat_register()?;
  let b = task.eat_register()?;
  alu::execute(op, &mut task.vm.registers, &mut task.vm.flags, a, b);
  Ok(())
}

// r[7] ← r[7] − 1; m[r[7]] ← r[a]
fn push<W>(task: &mut Task<'_, '_, W>) -> Result<(), Error>
where
  W: io::Write,
{
  let a = task.eat_register()?;
  let sp = task.grow_stack()?;
  // read after the decrement, so `PUSH r7` stores the new stack top
  let value = task.vm.registers[a];
  task.vm.write(sp, value)
}

// r[a] ← m[r[7]]; r[7] ← r[7] + 1
fn pop<W>(task: &mut Task<'_, '_, W>) -> Result<(), Error>
where
  W: io::Write,
{
  let a = task.eat_register()?;
  let value = task.top()?;
  task.vm.registers[a] = value;
  task.shrink_stack()
}

// r[7] ← r[7] − 1; m[r[7]] ← pc + 2; pc ← r[a]
fn call<W>(task: &mut Task<'_, '_, W>) -> Result<(), Error>
where
  W: io::Write,
{
  let a = task.eat_register()?;
  // pc already points past the operand
  let address = task.vm.pc;
  let return_address = u8::try_from(address).map_err(|_| Error::AddressFault { address })?;
  let sp = task.grow_stack()?;
  task.vm.write(sp, return_address)?;
  task.vm.pc = task.vm.registers[a] as usize;
  Ok(())
}

// pc ← m[r[7]]; r[7] ← r[7] + 1
fn ret<W>(task: &mut Task<'_, '_, W>) -> Result<(), Error>
where
  W: io::Write,
{
  let address = task.top()?;
  task.shrink_stack()?;
  task.vm.pc = address as usize;
  Ok(())
}

// pc ← r[a]
fn jump<W>(task: &mut Task<'_, '_, W>) -> Result<(), Error>
where
  W: io::Write,
{
  let a = task.eat_register()?;
  task.vm.pc = task.vm.registers[a] as usize;
  Ok(())
}

// if E == equal : pc ← r[a]
fn jump_if<W>(task: &mut Task<'_, '_, W>, equal: bool) -> Result<(), Error>
where
  W: io::Write,
{
  let a = task.eat_register()?;
  if task.vm.flags.equal == equal {
    task.vm.pc = task.vm.registers[a] as usize;
  }
  Ok(())
}
