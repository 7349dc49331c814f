//! pagesync CLI - publish notes from a vault to a git-hosted site.

use clap::Parser;

mod commands;
mod logging;
mod output;

use commands::{Cli, Commands, ConfigCommand};

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Sync { vault } => commands::sync::run(vault.as_deref()),
        Commands::ClearCache { yes } => commands::clear_cache::run(yes),
        Commands::Config { command } => match command {
            ConfigCommand::Show { json } => commands::config::show(json),
            ConfigCommand::Set { key, value } => commands::config::set(&key, &value),
            ConfigCommand::Path => commands::config::path(),
        },
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
