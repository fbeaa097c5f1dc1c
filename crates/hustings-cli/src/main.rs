//! `hustings` — operator tool for person histories and review decisions.
//!
//! # Usage
//!
//! ```text
//! hustings history versions.json [--diffs]
//! hustings review event.json
//! hustings rules
//! hustings rules needs_review_due_to_first_edits
//! hustings --config review.toml review event.json
//! ```
//!
//! Review thresholds come from the config file (default `hustings.toml`,
//! optional) and `HUSTINGS_*` environment variables, e.g.
//! `HUSTINGS_FIRST_EDITS=5`.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Person history and edit review tool")]
struct Cli {
  /// Path to the TOML file holding review thresholds.
  #[arg(short, long, value_name = "FILE", default_value = "hustings.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the parent map for an exported version list.
  History {
    /// JSON array of versions for one person.
    versions: PathBuf,

    /// Print each version's diff against its parents instead.
    #[arg(long)]
    diffs: bool,
  },
  /// Decide whether an edit event needs review.
  Review {
    /// JSON edit event.
    event: PathBuf,
  },
  /// List the configured rules in evaluation order, or show one rule.
  Rules {
    /// A stored rule key to print the label of.
    rule_type: Option<String>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Command::History { versions, diffs } => {
      commands::history(&versions, diffs)
    }
    Command::Review { event } => {
      let config = settings::load(&cli.config)?;
      commands::review(&event, &config)
    }
    Command::Rules { rule_type } => {
      let config = settings::load(&cli.config)?;
      commands::rules(&config, rule_type.as_deref())
    }
  }
}
