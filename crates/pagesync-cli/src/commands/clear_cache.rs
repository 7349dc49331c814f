//! `pagesync clear-cache` command - drop the cached working tree.

use anyhow::{Context, Result};
use inquire::Confirm;
use pagesync_core::{Config, DiskFs};

use crate::output;

/// Run the clear-cache command.
pub fn run(yes: bool) -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let cache_dir = config.paths.cache_dir();

    if !cache_dir.exists() {
        output::info("Cache is already empty");
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new(&format!(
            "Delete the cached working tree in {}?",
            cache_dir.display()
        ))
        .with_default(false)
        .prompt()
        .context("Confirmation cancelled")?;

        if !confirmed {
            output::info("Cache kept");
            return Ok(());
        }
    }

    let store = DiskFs::open(&cache_dir)?;
    if store.wipe().context("Failed to clear cache")? {
        output::success("Cache cleared - the next sync will clone afresh");
    } else {
        output::info("Cache is already empty");
    }
    Ok(())
}
