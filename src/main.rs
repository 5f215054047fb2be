//! Disassembly table generator entry point. Reads the opcode JSON description and
//! prints the `Disasm(...)` table for both opcode spaces.

mod err;
mod logger;
mod opcode;
mod operand;
mod table;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::OnceLock;

use clap::{ArgAction, Parser};
#[allow(unused)]
use log::{debug, error, info, trace, warn, LevelFilter};

use err::{GenError, GenErrorType, GenResult};
use logger::Logger;
use opcode::OpcodeSource;
use table::OpcodeTable;

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Generates the gameboy disassembly lookup table from an opcode JSON description.
#[derive(Parser, Debug)]
struct Args {
  /// JSON opcode description.
  #[arg(default_value = "scripts/opcodes.json")]
  input: PathBuf,
  /// Write the table to this file instead of stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,
  /// Raise the log level, may be repeated.
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,
}

fn main() {
  let args = Args::parse();

  init_logging(match args.verbose {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  });

  if let Err(e) = run(&args.input, args.output.as_deref()) {
    error!("{}", e);
    process::exit(1);
  }
}

fn run(input: &Path, output: Option<&Path>) -> GenResult<()> {
  let source = OpcodeSource::from_path(input)?;
  let table = OpcodeTable::build(&source);
  info!(
    "Generated {} unprefixed and {} cb-prefixed entries",
    table.unprefixed_records().count(),
    table.cbprefixed_records().count()
  );

  match output {
    Some(path) => {
      info!("Writing table to '{}'", path.display());
      let file = match File::create(path) {
        Ok(file) => file,
        Err(e) => return gen_err!(GenErrorType::Output(e)),
      };
      table.write_table(&mut BufWriter::new(file))
    }
    None => table.write_table(&mut io::stdout().lock()),
  }
}

// Initialize logging and set the level filter
fn init_logging(level_filter: LevelFilter) {
  log::set_max_level(level_filter);
  let logger = LOGGER.get_or_init(|| Logger::new(level_filter));
  match log::set_logger(logger) {
    Ok(()) => {}
    Err(msg) => panic!("Failed to initialize logging: {}", msg),
  }
  debug!("Log level {} enabled", level_filter);
}
