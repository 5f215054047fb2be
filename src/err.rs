//! Errors and Result types for the disassembly table generator.

use std::{fmt, io};

#[macro_export]
macro_rules! gen_err {
  ( $x:expr ) => {
    Err(GenError::new($x, file!(), line!()))
  };
}

pub type GenResult<T> = Result<T, GenError>;

/// Error type for the table generator
#[derive(Debug)]
pub struct GenError {
  error: GenErrorType,
  line: u32,
  file: &'static str,
}

impl GenError {
  pub fn new(error: GenErrorType, file: &'static str, line: u32) -> GenError {
    GenError { error, line, file }
  }

  #[cfg(test)]
  pub fn kind(&self) -> &GenErrorType {
    &self.error
  }
}

#[derive(Debug)]
pub enum GenErrorType {
  /// The opcode source could not be read.
  SourceUnreadable(io::Error),
  /// The opcode source is not valid JSON or a record is missing a required field.
  SourceMalformed(serde_json::Error),
  /// A top level opcode space is absent from the source.
  MissingSpace(&'static str),
  /// An address is not a hex byte.
  BadAddress(String),
  /// A declared instruction length of zero.
  BadLength { addr: u8, length: u32 },
  /// A second operand without a first one.
  BadOperands(u8),
  /// Writing the generated table failed.
  Output(io::Error),
}

impl fmt::Display for GenErrorType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GenErrorType::SourceUnreadable(e) => write!(f, "unable to read opcode source: {}", e),
      GenErrorType::SourceMalformed(e) => write!(f, "malformed opcode source: {}", e),
      GenErrorType::MissingSpace(space) => write!(f, "opcode source has no \"{}\" table", space),
      GenErrorType::BadAddress(addr) => write!(f, "invalid opcode address \"{}\"", addr),
      GenErrorType::BadLength { addr, length } => {
        write!(f, "opcode {:#04x} has invalid length {}", addr, length)
      }
      GenErrorType::BadOperands(addr) => {
        write!(f, "opcode {:#04x} has operand2 but no operand1", addr)
      }
      GenErrorType::Output(e) => write!(f, "unable to write table: {}", e),
    }
  }
}

impl fmt::Display for GenError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({}:{})", self.error, self.file, self.line)
  }
}

impl std::error::Error for GenError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match &self.error {
      GenErrorType::SourceUnreadable(e) | GenErrorType::Output(e) => Some(e),
      GenErrorType::SourceMalformed(e) => Some(e),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_err_display() {
    let err: GenResult<()> = gen_err!(GenErrorType::BadLength {
      addr: 0x3e,
      length: 0
    });
    let msg = format!("{}", err.unwrap_err());
    assert!(msg.starts_with("opcode 0x3e has invalid length 0 ("));
    assert!(msg.contains("err.rs"));
  }

  #[test]
  fn test_err_source() {
    use std::error::Error;

    let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
    let err = GenError::new(GenErrorType::SourceUnreadable(io_err), file!(), line!());
    assert!(err.source().is_some());
    let err = GenError::new(GenErrorType::MissingSpace("unprefixed"), file!(), line!());
    assert!(err.source().is_none());
  }
}
