use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::vm::MEMORY_SIZE;

/// A sequence of program bytes, loaded into memory from address 0
pub trait Image {
  fn bytes(&self) -> &[u8];
}

/// A `Program` is a parsed program image that our virtual machine may load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
  bytes: Vec<u8>,
}

impl From<Vec<u8>> for Program {
  fn from(bytes: Vec<u8>) -> Self {
    Self { bytes }
  }
}

impl Image for Program {
  fn bytes(&self) -> &[u8] {
    &self.bytes
  }
}

/// An error that occurred while reading or parsing a program image
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
  #[error("file not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("failed to read program image")]
  Io(#[from] io::Error),

  #[error("invalid number `{token}` on line {line}")]
  InvalidLiteral { line: usize, token: String },

  #[error("program is {len} bytes, memory only holds {}", MEMORY_SIZE)]
  TooLarge { len: usize },
}

impl Program {
  /// Read and parse the text image at `path`
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| match e.kind() {
      io::ErrorKind::NotFound => LoadError::NotFound {
        path: path.to_path_buf(),
      },
      _ => LoadError::Io(e),
    })?;
    let program: Program = source.parse()?;
    tracing::debug!(path = %path.display(), len = program.len(), "loaded program image");
    Ok(program)
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

impl FromStr for Program {
  type Err = LoadError;

  /// One byte per line, written in base 2. Anything after a `#` is a comment;
  /// blank and comment-only lines are skipped.
  fn from_str(source: &str) -> Result<Self, Self::Err> {
    let mut bytes = Vec::new();
    for (index, raw) in source.lines().enumerate() {
      let code = raw.split_once('#').map_or(raw, |(code, _)| code);
      let Some(token) = code.split_whitespace().next() else {
        continue;
      };
      let byte = u8::from_str_radix(token, 2).map_err(|_| LoadError::InvalidLiteral {
        line: index + 1,
        token: token.to_owned(),
      })?;
      bytes.push(byte);
    }
    if bytes.len() > MEMORY_SIZE {
      return Err(LoadError::TooLarge { len: bytes.len() });
    }
    Ok(bytes.into())
  }
}
