mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{Flow, InstallType};
use crate::output::OutputFormat;

/// bp - Build and test repositories with buildpacks
#[derive(Parser)]
#[command(name = "bp")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  global: GlobalOpts,

  #[command(subcommand)]
  command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalOpts {
  /// Configuration file (default: $XDG_CONFIG_HOME/buildpack/config.yml)
  #[arg(long, global = true)]
  pub config: Option<PathBuf>,

  /// Directory holding installed buildpacks
  #[arg(long, global = true)]
  pub pack_dir: Option<PathBuf>,

  /// Directory under which run workspaces are created
  #[arg(long, global = true)]
  pub workspace_dir: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Output format
  #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
  /// Clone a repository and run the buildpack's bootstrap stage
  Build(RunArgs),

  /// Clone a repository and run the buildpack's bootstrap and test stages
  Test(RunArgs),

  /// Install a buildpack into the pack directory
  Install {
    /// Repository URL (vcs) or directory path (local)
    target: String,

    /// How to fetch the buildpack
    #[arg(short = 't', long = "type", value_enum, default_value = "vcs")]
    kind: InstallType,

    /// Revision to check out (vcs only)
    #[arg(long)]
    rev: Option<String>,
  },

  /// List installed buildpacks
  List,

  /// Show a buildpack's files and stage commands
  Show {
    /// Buildpack name
    pack: String,
  },
}

#[derive(Args, Debug)]
pub struct RunArgs {
  /// Repository URL or path
  pub repo: String,

  /// Buildpack name
  pub pack: String,

  /// Revision to check out (default: master)
  #[arg(long)]
  pub rev: Option<String>,

  /// Skip remaining stages once one fails
  #[arg(long)]
  pub halt_on_failure: bool,
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  // Logs go to stderr so stdout stays parseable with --output json.
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.global.verbose);

  match cli.command {
    Commands::Build(args) => cmd::cmd_run(Flow::Build, &args, &cli.global),
    Commands::Test(args) => cmd::cmd_run(Flow::Test, &args, &cli.global),
    Commands::Install { target, kind, rev } => cmd::cmd_install(&target, kind, rev.as_deref(), &cli.global),
    Commands::List => cmd::cmd_list(&cli.global),
    Commands::Show { pack } => cmd::cmd_show(&pack, &cli.global),
  }
}
