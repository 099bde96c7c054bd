mod app;
mod cache;
mod catalog;
mod commands;
mod config;
mod event;
mod logging;
mod output;
mod session;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;

use crate::catalog::FilterSet;

#[derive(Parser, Debug)]
#[command(name = "rmdex")]
#[command(about = "An offline-first browser for the Rick and Morty character catalog")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rmdex/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Serve everything from the local cache
  #[arg(long, global = true)]
  offline: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print one page of characters
  List {
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    #[command(flatten)]
    filters: FilterArgs,
  },
  /// Print one character in full
  Show { id: u32 },
  /// Interactive paginated session
  Browse {
    #[command(flatten)]
    filters: FilterArgs,
  },
  /// Download the whole catalog for offline use
  Sync {
    /// Concurrent page requests
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,
  },
  /// Inspect or empty the local cache
  Cache {
    #[command(subcommand)]
    action: CacheCommand,
  },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
  /// Show what is cached
  Stats,
  /// Drop cached data
  Clear {
    /// Only drop this page of the unfiltered listing
    #[arg(long)]
    page: Option<u32>,
  },
}

#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
  /// Name substring
  #[arg(long)]
  name: Option<String>,
  /// alive, dead or unknown
  #[arg(long)]
  status: Option<String>,
  #[arg(long)]
  species: Option<String>,
  /// Subspecies or variant
  #[arg(long = "type")]
  kind: Option<String>,
  /// female, male, genderless or unknown
  #[arg(long)]
  gender: Option<String>,
}

impl From<FilterArgs> for FilterSet {
  fn from(args: FilterArgs) -> Self {
    FilterSet {
      name: args.name,
      status: args.status,
      species: args.species,
      kind: args.kind,
      gender: args.gender,
    }
    .normalized()
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  logging::init_logger(&config::Config::data_dir()?.join("logs"))?;

  let mut config = config::Config::load(args.config.as_deref())?;
  if args.offline {
    config.offline = true;
  }

  let app = app::App::new(config)?;

  match args.command {
    Command::List { page, filters } => app.list(page, filters.into()).await,
    Command::Show { id } => app.show(id).await,
    Command::Browse { filters } => app.browse(filters.into()).await,
    Command::Sync { concurrency } => app.sync(concurrency).await,
    Command::Cache { action } => match action {
      CacheCommand::Stats => app.cache_stats(),
      CacheCommand::Clear { page } => app.cache_clear(page),
    },
  }
}
