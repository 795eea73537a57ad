//! folio: preview what saving a content draft writes to the repository.

mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// Plan Git commits for CMS entry drafts
#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the file changes a save would commit
  Plan {
    /// Collection definition (YAML or JSON)
    #[arg(short, long)]
    collection: PathBuf,

    /// Draft to save (JSON)
    #[arg(short, long)]
    draft: PathBuf,

    /// SHA cache index used to annotate changes with previous hashes
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Save settings (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show the slugs a save would resolve
  Slug {
    /// Collection definition (YAML or JSON)
    #[arg(short, long)]
    collection: PathBuf,

    /// Draft to save (JSON)
    #[arg(short, long)]
    draft: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Plan {
      collection,
      draft,
      cache,
      config,
      output,
    } => cmd::cmd_plan(&collection, &draft, cache.as_deref(), config.as_deref(), cli.verbose, output),
    Commands::Slug {
      collection,
      draft,
      output,
    } => cmd::cmd_slug(&collection, &draft, output),
  }
}
