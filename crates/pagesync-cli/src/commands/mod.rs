//! Command definitions and dispatch targets.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

pub mod clear_cache;
pub mod completions;
pub mod config;
pub mod sync;

/// Publish notes from a vault to a git-hosted site.
#[derive(Debug, Parser)]
#[command(name = "pagesync", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Only print errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log more (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clone or pull the site, stage published notes, commit and push.
    Sync {
        /// Vault to publish from (defaults to `paths.vault`).
        #[arg(long)]
        vault: Option<PathBuf>,
    },

    /// Delete the cached working tree so the next sync clones afresh.
    ClearCache {
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show or change configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration with the token masked.
    Show {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Set a value, e.g. `pagesync config set remote.git_url https://...`.
    Set { key: String, value: String },

    /// Print the config file location.
    Path,
}
