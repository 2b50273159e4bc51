use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use emulator::image::{LoadError, Program};
use emulator::vm::Vm;

/// Run an LS-8 program image
#[derive(Parser)]
#[command(version)]
struct Args {
  /// `.ls8` image to run, one base-2 byte per line
  path: PathBuf,

  /// Log a trace line for every instruction to stderr
  #[arg(short, long)]
  trace: bool,
}

fn main() -> ExitCode {
  let args = Args::parse();
  init_logging(args.trace);

  let program = match Program::from_path(&args.path) {
    Ok(program) => program,
    Err(err) => {
      let code = match err {
        LoadError::NotFound { .. } => 2,
        _ => 1,
      };
      report(&err);
      return ExitCode::from(code);
    }
  };

  let mut vm = match Vm::with_program(&program) {
    Ok(vm) => vm,
    Err(err) => {
      report(&err);
      return ExitCode::from(1);
    }
  };

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  let result = vm.run(&mut out);
  // keep whatever was printed before a fault
  let flushed = out.flush();
  if let Err(err) = result {
    report(&err);
    return ExitCode::from(3);
  }
  if let Err(err) = flushed {
    report(&err);
    return ExitCode::from(3);
  }
  ExitCode::SUCCESS
}

fn init_logging(trace: bool) {
  let filter = if trace {
    EnvFilter::new("emulator=trace")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .without_time()
    .with_target(false)
    .init();
}

fn report(err: &dyn std::error::Error) {
  eprint!("{} {err}", "error:".red().bold());
  let mut source = err.source();
  while let Some(cause) = source {
    eprint!(": {cause}");
    source = cause.source();
  }
  eprintln!();
}
