//! Logging support for the table generator. Log lines go to stderr since stdout
//! carries the generated table. Level names are only colored when stderr is a
//! terminal, so redirected logs stay free of escape codes.

use std::io::{self, IsTerminal};

use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Logging implementation for the Log trait.
pub struct Logger {
  level_filter: LevelFilter,
  color: bool,
}

impl Logger {
  /// Create a new Logger with the provided level filter, coloring output if stderr
  /// is a terminal.
  pub fn new(level: LevelFilter) -> Self {
    Self::with_color(level, io::stderr().is_terminal())
  }

  pub fn with_color(level: LevelFilter, color: bool) -> Self {
    Logger {
      level_filter: level,
      color,
    }
  }

  fn level_label(&self, level: Level) -> String {
    let label = format!("{:5}", level);
    if !self.color {
      return label;
    }
    let colored_label = match level {
      Level::Error => label.red(),
      Level::Warn => label.yellow(),
      Level::Info => label.cyan(),
      Level::Debug | Level::Trace => label.normal(),
    };
    colored_label.to_string()
  }

  fn format(&self, record: &Record) -> String {
    format!(
      "[{}] [{}] {}",
      self.level_label(record.level()),
      record.metadata().target(),
      record.args()
    )
  }
}

impl Log for Logger {
  fn enabled(&self, metadata: &Metadata<'_>) -> bool {
    metadata.level() <= self.level_filter
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      eprintln!("{}", self.format(record));
    }
  }

  fn flush(&self) {}
}
