mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use cmd::{DumpFormat, cmd_llb, cmd_preview};
use output::{OutputFormat, print_error};

/// poemkit - build frontend that turns a poem into image history
#[derive(Parser)]
#[command(name = "poemkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (overridden by RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Write the build graph to stdout instead of solving it
  Llb {
    /// Output encoding
    #[arg(long, value_enum, default_value_t)]
    format: DumpFormat,

    /// Frontend option as key=value (repeatable)
    #[arg(long = "opt", value_parser = parse_key_val)]
    opts: Vec<(String, String)>,
  },

  /// Run the full build against a local directory and show the image config
  Preview {
    /// Directory standing in for the backend's snapshot
    #[arg(long, default_value = ".")]
    context: PathBuf,

    /// Artifact file (shorthand for --opt file=NAME)
    #[arg(short, long)]
    file: Option<String>,

    /// Frontend option as key=value (repeatable)
    #[arg(long = "opt", value_parser = parse_key_val)]
    opts: Vec<(String, String)>,

    /// Abort the build after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
  let (key, value) = s
    .split_once('=')
    .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
  if key.is_empty() {
    return Err(format!("empty key in '{}'", s));
  }
  Ok((key.to_string(), value.to_string()))
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Llb { format, opts } => cmd_llb(format, opts),
    Commands::Preview {
      context,
      file,
      opts,
      timeout,
      format,
    } => cmd_preview(&context, file, opts, timeout, format),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!(error = %format!("{:#}", e), "fatal error");
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
