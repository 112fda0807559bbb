mod cmd;
mod output;
mod prompts;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use anchorkeep_lib::paths;
use anchorkeep_lib::types::{AnchorUuid, ObjectKind};

use crate::output::{OutputFormat, print_error};

/// anchorkeep - inspect and maintain saved spatial anchors
#[derive(Parser)]
#[command(name = "anchorkeep")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  /// Preference file [default: <data dir>/prefs.json, or $ANCHORKEEP_PREFS]
  #[arg(long, global = true)]
  prefs: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List saved anchors and their object kinds
  List,

  /// Check the stored layout for inconsistencies
  Check,

  /// Remove one anchor from the save-list along with its kind
  Forget {
    uuid: AnchorUuid,
  },

  /// Set the object kind restored for an anchor
  SetType {
    uuid: AnchorUuid,

    /// wall, cube, floor, table or chair
    kind: ObjectKind,
  },

  /// Remove every saved anchor from the preferences
  Clear {
    /// Do not ask for confirmation
    #[arg(short, long)]
    force: bool,
  },

  /// Move anchors from the legacy numbered layout into the save-list
  Migrate,

  /// Run a script of anchor operations against the simulated platform
  Session {
    /// Script file, one operation per line
    script: PathBuf,

    /// Simulated device storage [default: <data dir>/device.json, or $ANCHORKEEP_DEVICE]
    #[arg(long)]
    device: Option<PathBuf>,

    /// Batch load timeout, overriding the config (e.g. "2s", "500ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,
  },

  /// Show file locations and effective configuration
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let prefs = cli.prefs.unwrap_or_else(paths::prefs_path);

  match cli.command {
    Commands::List => cmd::cmd_list(&prefs, cli.verbose, cli.output),
    Commands::Check => cmd::cmd_check(&prefs, cli.output),
    Commands::Forget { uuid } => cmd::cmd_forget(&prefs, &uuid),
    Commands::SetType { uuid, kind } => cmd::cmd_set_type(&prefs, &uuid, kind),
    Commands::Clear { force } => cmd::cmd_clear(&prefs, force),
    Commands::Migrate => cmd::cmd_migrate(&prefs),
    Commands::Session {
      script,
      device,
      timeout,
    } => {
      let device = device.unwrap_or_else(paths::device_path);
      cmd::cmd_session(&script, &prefs, &device, timeout, cli.output)
    }
    Commands::Info => cmd::cmd_info(&prefs, cli.output),
  }
}
