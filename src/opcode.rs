//! Opcode descriptions as read from the JSON opcode source. The source is keyed by
//! opcode space ("unprefixed", "cbprefixed") and each space maps a hex key to a
//! record describing one instruction.

use std::fs;
use std::path::Path;

#[allow(unused)]
use log::{debug, error, info, trace, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::err::{GenError, GenErrorType, GenResult};
use crate::gen_err;

const UNPREFIXED: &str = "unprefixed";
const CBPREFIXED: &str = "cbprefixed";

#[derive(Deserialize)]
struct RawSource {
  unprefixed: Option<Map<String, Value>>,
  cbprefixed: Option<Map<String, Value>>,
}

/// Record layout inside the JSON source. Fields we don't render (cycles, flags) are
/// ignored.
#[derive(Deserialize)]
struct RawOpcode {
  #[serde(alias = "address")]
  addr: String,
  mnemonic: String,
  length: u32,
  operand1: Option<String>,
  operand2: Option<String>,
}

/// Operands of a single instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operands {
  None,
  One(String),
  Two(String, String),
}

/// One known opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeDescription {
  /// Opcode the record is filed under in the source. Unprefixed opcodes are looked up
  /// by this, cb keys are never parsed.
  pub key: Option<u8>,
  pub addr: u8,
  pub mnemonic: String,
  pub operands: Operands,
  pub length: u32,
}

impl OpcodeDescription {
  fn from_raw(key: Option<u8>, raw: RawOpcode) -> GenResult<Self> {
    let addr = parse_addr(&raw.addr)?;
    if raw.length == 0 {
      return gen_err!(GenErrorType::BadLength {
        addr,
        length: raw.length
      });
    }
    let operands = match (raw.operand1, raw.operand2) {
      (None, None) => Operands::None,
      (Some(op1), None) => Operands::One(op1),
      (Some(op1), Some(op2)) => Operands::Two(op1, op2),
      (None, Some(_)) => return gen_err!(GenErrorType::BadOperands(addr)),
    };
    Ok(OpcodeDescription {
      key,
      addr,
      mnemonic: raw.mnemonic,
      operands,
      length: raw.length,
    })
  }
}

/// Parses a textual hex byte such as "0x3e". The prefix is optional.
pub fn parse_addr(text: &str) -> GenResult<u8> {
  let trimmed = text.trim();
  let digits = trimmed
    .strip_prefix("0x")
    .or_else(|| trimmed.strip_prefix("0X"))
    .unwrap_or(trimmed);
  match u8::from_str_radix(digits, 16) {
    Ok(addr) => Ok(addr),
    Err(_) => gen_err!(GenErrorType::BadAddress(String::from(text))),
  }
}

/// All descriptions of both opcode spaces, in source order.
#[derive(Debug, Default)]
pub struct OpcodeSource {
  pub unprefixed: Vec<OpcodeDescription>,
  pub cbprefixed: Vec<OpcodeDescription>,
}

impl OpcodeSource {
  /// Reads and parses the opcode source at `path`.
  pub fn from_path(path: &Path) -> GenResult<Self> {
    info!("Loading opcode source from '{}'", path.display());
    let json = match fs::read_to_string(path) {
      Ok(json) => json,
      Err(e) => return gen_err!(GenErrorType::SourceUnreadable(e)),
    };
    Self::from_json(&json)
  }

  pub fn from_json(json: &str) -> GenResult<Self> {
    let raw: RawSource = match serde_json::from_str(json) {
      Ok(raw) => raw,
      Err(e) => return gen_err!(GenErrorType::SourceMalformed(e)),
    };

    let unprefixed = match raw.unprefixed {
      Some(space) => read_space(UNPREFIXED, space, true)?,
      None => return gen_err!(GenErrorType::MissingSpace(UNPREFIXED)),
    };
    let cbprefixed = match raw.cbprefixed {
      Some(space) => read_space(CBPREFIXED, space, false)?,
      None => return gen_err!(GenErrorType::MissingSpace(CBPREFIXED)),
    };
    info!(
      "Loaded {} unprefixed and {} cb-prefixed opcodes",
      unprefixed.len(),
      cbprefixed.len()
    );

    Ok(OpcodeSource {
      unprefixed,
      cbprefixed,
    })
  }
}

fn read_space(
  name: &str,
  space: Map<String, Value>,
  keyed: bool,
) -> GenResult<Vec<OpcodeDescription>> {
  let mut descs = Vec::with_capacity(space.len());
  for (key, value) in space {
    let raw: RawOpcode = match serde_json::from_value(value) {
      Ok(raw) => raw,
      Err(e) => return gen_err!(GenErrorType::SourceMalformed(e)),
    };
    let parsed_key = if keyed {
      Some(parse_addr(&key)?)
    } else {
      None
    };
    let desc = OpcodeDescription::from_raw(parsed_key, raw)?;
    if let Some(k) = desc.key {
      if k != desc.addr {
        warn!(
          "{} key '{}' disagrees with its address {:#04x}, filing under the key",
          name, key, desc.addr
        );
      }
    }
    trace!("{} {:#04x}: {}", name, desc.addr, desc.mnemonic);
    descs.push(desc);
  }
  Ok(descs)
}
