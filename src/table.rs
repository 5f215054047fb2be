//! Builds the disassembly table from opcode descriptions and writes it out as
//! `Disasm("<text>", <size>),` initializer lines, ready to be pasted into the
//! disassembler's lookup tables.

use std::fmt;
use std::io::Write;

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use crate::err::{GenError, GenErrorType, GenResult};
use crate::gen_err;
use crate::opcode::{OpcodeDescription, OpcodeSource, Operands};
use crate::operand::transform_operand;

pub const PREFIX_CB_OP: u8 = 0xcb;

/// Text emitted for an opcode with no description.
pub const UNDEFINED_NAME: &str = "#ud";

/// A readability comment is emitted every this many entries.
const MARKER_INTERVAL: usize = 10;

/// One rendered table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrRecord {
  pub text: String,
  pub size: u32,
}

impl InstrRecord {
  pub fn undefined() -> Self {
    InstrRecord {
      text: String::from(UNDEFINED_NAME),
      size: 1,
    }
  }

  /// Renders a description. Only the second operand goes through the register
  /// normalizer, the first is just lowercased.
  pub fn render(desc: &OpcodeDescription) -> Self {
    let mnemonic = desc.mnemonic.to_lowercase();
    let text = match &desc.operands {
      Operands::None => mnemonic,
      Operands::One(op1) => format!("{} {}", mnemonic, op1.to_lowercase()),
      Operands::Two(op1, op2) => format!(
        "{} {}, {}",
        mnemonic,
        op1.to_lowercase(),
        transform_operand(&op2.to_lowercase())
      ),
    };

    // the prefix byte is always followed by the cb opcode
    let size = if desc.addr == PREFIX_CB_OP {
      2
    } else {
      desc.length
    };

    InstrRecord { text, size }
  }
}

impl fmt::Display for InstrRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Disasm(\"{}\", {}),", self.text, self.size)
  }
}

/// A line of generated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLine {
  /// Comment carrying the current position. Only there for whoever reads the output.
  Marker(usize),
  Record(InstrRecord),
}

impl fmt::Display for TableLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TableLine::Marker(pos) => write!(f, "// {:#x}", pos),
      TableLine::Record(record) => write!(f, "{}", record),
    }
  }
}

/// The generated table for both opcode spaces.
pub struct OpcodeTable {
  unprefixed: Vec<TableLine>,
  cbprefixed: Vec<TableLine>,
}

impl OpcodeTable {
  pub fn build(source: &OpcodeSource) -> Self {
    OpcodeTable {
      unprefixed: Self::build_unprefixed(&source.unprefixed),
      cbprefixed: Self::build_cbprefixed(&source.cbprefixed),
    }
  }

  /// Walks every opcode in numeric order, matching descriptions by their source key.
  /// Opcodes without a description get the undefined entry, opcodes with several
  /// descriptions get one entry each.
  fn build_unprefixed(descs: &[OpcodeDescription]) -> Vec<TableLine> {
    let mut by_key: Vec<Vec<&OpcodeDescription>> = vec![Vec::new(); 0x100];
    for desc in descs {
      by_key[desc.key.unwrap_or(desc.addr) as usize].push(desc);
    }

    let mut lines = Vec::with_capacity(0x100 + 0x100 / MARKER_INTERVAL + 1);
    for (i, matches) in by_key.iter().enumerate() {
      if i % MARKER_INTERVAL == 0 {
        lines.push(TableLine::Marker(i));
      }
      match matches.len() {
        0 => {
          debug!("No description for opcode {:#04x}, marking undefined", i);
          lines.push(TableLine::Record(InstrRecord::undefined()));
        }
        n => {
          if n > 1 {
            warn!("Opcode {:#04x} has {} descriptions, emitting all", i, n);
          }
          lines.extend(
            matches
              .iter()
              .map(|desc| TableLine::Record(InstrRecord::render(desc))),
          );
        }
      }
    }
    lines
  }

  /// Cb opcodes are emitted in source order with no gap filling.
  fn build_cbprefixed(descs: &[OpcodeDescription]) -> Vec<TableLine> {
    let mut lines = Vec::with_capacity(descs.len() + descs.len() / MARKER_INTERVAL + 1);
    for (i, desc) in descs.iter().enumerate() {
      if i % MARKER_INTERVAL == 0 {
        lines.push(TableLine::Marker(i));
      }
      lines.push(TableLine::Record(InstrRecord::render(desc)));
    }
    lines
  }

  pub fn unprefixed(&self) -> &[TableLine] {
    &self.unprefixed
  }

  pub fn cbprefixed(&self) -> &[TableLine] {
    &self.cbprefixed
  }

  pub fn unprefixed_records(&self) -> impl Iterator<Item = &InstrRecord> {
    records(self.unprefixed())
  }

  pub fn cbprefixed_records(&self) -> impl Iterator<Item = &InstrRecord> {
    records(self.cbprefixed())
  }

  /// Writes the whole table to `out`.
  pub fn write_table<W: Write>(&self, out: &mut W) -> GenResult<()> {
    if let Err(e) = write!(out, "{}", self).and_then(|_| out.flush()) {
      return gen_err!(GenErrorType::Output(e));
    }
    Ok(())
  }
}

fn records(lines: &[TableLine]) -> impl Iterator<Item = &InstrRecord> {
  lines.iter().filter_map(|line| match line {
    TableLine::Record(record) => Some(record),
    TableLine::Marker(_) => None,
  })
}

impl fmt::Display for OpcodeTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "// === UNPREFIXED ===")?;
    for line in &self.unprefixed {
      writeln!(f, "{}", line)?;
    }
    writeln!(f)?;
    writeln!(f, "// === CBPREFIXED ===")?;
    for line in &self.cbprefixed {
      writeln!(f, "{}", line)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn desc(addr: u8, mnemonic: &str, operands: Operands, length: u32) -> OpcodeDescription {
    OpcodeDescription {
      key: Some(addr),
      addr,
      mnemonic: String::from(mnemonic),
      operands,
      length,
    }
  }

  fn one(op: &str) -> Operands {
    Operands::One(String::from(op))
  }

  fn two(op1: &str, op2: &str) -> Operands {
    Operands::Two(String::from(op1), String::from(op2))
  }

  #[test]
  fn test_render_no_operands() {
    let record = InstrRecord::render(&desc(0x00, "NOP", Operands::None, 1));
    assert_eq!(record.text, "nop");
    assert_eq!(record.size, 1);
  }

  #[test]
  fn test_render_one_operand() {
    let record = InstrRecord::render(&desc(0x04, "INC", one("B"), 1));
    assert_eq!(record.text, "inc b");
    // a sole operand is never normalized
    let record = InstrRecord::render(&desc(0xe9, "JP", one("(HL)"), 1));
    assert_eq!(record.text, "jp (hl)");
  }

  #[test]
  fn test_render_two_operands() {
    let record = InstrRecord::render(&desc(0x7e, "LD", two("a", "(hl)"), 1));
    assert_eq!(record.text, "ld a, (%hl)");
    let record = InstrRecord::render(&desc(0xf8, "LD", two("HL", "SP+r8"), 2));
    assert_eq!(record.text, "ld hl, %sp+r8");
    assert_eq!(record.size, 2);
    let record = InstrRecord::render(&desc(0x06, "LD", two("B", "d8"), 2));
    assert_eq!(record.text, "ld b, d8");
  }

  #[test]
  fn test_render_prefix_size() {
    let record = InstrRecord::render(&desc(PREFIX_CB_OP, "PREFIX", one("CB"), 1));
    assert_eq!(record.text, "prefix cb");
    assert_eq!(record.size, 2);
    let record = InstrRecord::render(&desc(PREFIX_CB_OP, "PREFIX", one("CB"), 3));
    assert_eq!(record.size, 2);
  }

  #[test]
  fn test_undefined_record() {
    let record = InstrRecord::undefined();
    assert_eq!(record.text, "#ud");
    assert_eq!(record.size, 1);
    assert_eq!(format!("{}", record), "Disasm(\"#ud\", 1),");
  }

  #[test]
  fn test_unprefixed_complete() {
    let source = OpcodeSource {
      unprefixed: vec![
        desc(0x3e, "LD", two("A", "d8"), 2),
        desc(0x00, "NOP", Operands::None, 1),
      ],
      cbprefixed: Vec::new(),
    };
    let table = OpcodeTable::build(&source);
    let records: Vec<&InstrRecord> = table.unprefixed_records().collect();
    assert_eq!(records.len(), 0x100);
    assert_eq!(records[0x00].text, "nop");
    assert_eq!(records[0x3e].text, "ld a, d8");
    assert_eq!(records[0x3e].size, 2);
    for (i, record) in records.iter().enumerate() {
      if i != 0x00 && i != 0x3e {
        assert_eq!(**record, InstrRecord::undefined());
      }
    }
  }

  #[test]
  fn test_unprefixed_markers() {
    let table = OpcodeTable::build(&OpcodeSource::default());
    let markers: Vec<usize> = table
      .unprefixed()
      .iter()
      .filter_map(|line| match line {
        TableLine::Marker(pos) => Some(*pos),
        TableLine::Record(_) => None,
      })
      .collect();
    assert_eq!(markers, (0..0x100).step_by(10).collect::<Vec<_>>());
    assert_eq!(table.unprefixed()[0], TableLine::Marker(0));
    assert_eq!(table.unprefixed()[11], TableLine::Marker(10));
  }

  #[test]
  fn test_unprefixed_duplicates() {
    let source = OpcodeSource {
      unprefixed: vec![
        desc(0x10, "STOP", one("0"), 2),
        desc(0x10, "STOP", Operands::None, 1),
      ],
      cbprefixed: Vec::new(),
    };
    let table = OpcodeTable::build(&source);
    let records: Vec<&InstrRecord> = table.unprefixed_records().collect();
    assert_eq!(records.len(), 0x101);
    assert_eq!(records[0x10].text, "stop 0");
    assert_eq!(records[0x11].text, "stop");
    assert_eq!(*records[0x12], InstrRecord::undefined());
  }

  #[test]
  fn test_unprefixed_matches_key() {
    let source = OpcodeSource::from_json(
      r#"{
        "unprefixed": {
          "0x01": { "mnemonic": "NOP", "length": 1, "addr": "0x02" },
          "0x05": { "mnemonic": "PREFIX", "length": 1, "operand1": "CB", "addr": "0xcb" }
        },
        "cbprefixed": {}
      }"#,
    )
    .unwrap();
    let table = OpcodeTable::build(&source);
    let records: Vec<&InstrRecord> = table.unprefixed_records().collect();
    assert_eq!(records.len(), 0x100);
    assert_eq!(records[0x01].text, "nop");
    assert_eq!(*records[0x02], InstrRecord::undefined());
    // size still follows the record's address
    assert_eq!(records[0x05].text, "prefix cb");
    assert_eq!(records[0x05].size, 2);
    assert_eq!(*records[0xcb], InstrRecord::undefined());
  }

  #[test]
  fn test_cbprefixed_source_order() {
    let source = OpcodeSource {
      unprefixed: Vec::new(),
      cbprefixed: vec![
        desc(0x11, "RL", one("C"), 2),
        desc(0x00, "RLC", one("B"), 2),
        desc(0x46, "BIT", two("0", "(HL)"), 2),
      ],
    };
    let table = OpcodeTable::build(&source);
    let texts: Vec<&str> = table
      .cbprefixed_records()
      .map(|r| r.text.as_str())
      .collect();
    assert_eq!(texts, vec!["rl c", "rlc b", "bit 0, (%hl)"]);
    assert_eq!(table.cbprefixed()[0], TableLine::Marker(0));
  }

  #[test]
  fn test_cbprefixed_no_gap_fill() {
    let cbprefixed: Vec<OpcodeDescription> = (0..25u8)
      .map(|i| desc(i, "SWAP", one("A"), 2))
      .collect();
    let source = OpcodeSource {
      unprefixed: Vec::new(),
      cbprefixed,
    };
    let table = OpcodeTable::build(&source);
    assert_eq!(table.cbprefixed_records().count(), 25);
    // markers at positions 0, 10 and 20
    assert_eq!(table.cbprefixed().len(), 28);
    assert_eq!(table.cbprefixed()[22], TableLine::Marker(20));
  }

  #[test]
  fn test_write_table() {
    let source = OpcodeSource {
      unprefixed: vec![desc(0x00, "NOP", Operands::None, 1)],
      cbprefixed: vec![desc(0x00, "RLC", two("B", "C"), 2)],
    };
    let table = OpcodeTable::build(&source);
    let mut out = Vec::new();
    table.write_table(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "// === UNPREFIXED ===");
    assert_eq!(lines[1], "// 0x0");
    assert_eq!(lines[2], "Disasm(\"nop\", 1),");
    assert_eq!(lines[3], "Disasm(\"#ud\", 1),");
    assert_eq!(lines[12], "// 0xa");
    assert!(lines.contains(&"// 0xfa"));

    let cb_start = lines
      .iter()
      .position(|l| *l == "// === CBPREFIXED ===")
      .unwrap();
    assert_eq!(lines[cb_start - 1], "");
    assert_eq!(lines[cb_start + 1], "// 0x0");
    assert_eq!(lines[cb_start + 2], "Disasm(\"rlc b, %c\", 2),");
    assert_eq!(lines.len(), cb_start + 3);
  }
}
