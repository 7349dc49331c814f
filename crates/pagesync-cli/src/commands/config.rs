//! `pagesync config` commands - inspect and edit `config.toml`.

use anyhow::{Context, Result, bail};
use pagesync_core::Config;
use pagesync_core::config::KEYS;

use crate::output;

/// Print the configuration, token masked.
pub fn show(json: bool) -> Result<()> {
    let path = Config::default_path();
    let config = Config::load(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .redacted();

    let rendered = if json {
        serde_json::to_string_pretty(&config)?
    } else {
        config.to_toml()?
    };
    output::essential(rendered.trim_end());
    Ok(())
}

/// Set one key and save immediately.
pub fn set(key: &str, value: &str) -> Result<()> {
    let path = Config::default_path();
    let mut config = Config::load(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if let Err(e) = config.set(key, value) {
        if matches!(e, pagesync_core::Error::UnknownConfigKey(_)) {
            bail!("{e} - valid keys: {}", KEYS.join(", "));
        }
        return Err(e.into());
    }
    config
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::success(&format!("Set {key}"));
    Ok(())
}

/// Print where the config file lives.
#[allow(clippy::unnecessary_wraps)]
pub fn path() -> Result<()> {
    output::essential(&Config::default_path().display().to_string());
    Ok(())
}
