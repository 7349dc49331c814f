//! Configuration management for pagesync.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Overrides the directory holding `config.toml`.
pub const CONFIG_DIR_ENV: &str = "PAGESYNC_CONFIG_DIR";
/// Overrides the default cache directory.
pub const CACHE_DIR_ENV: &str = "PAGESYNC_CACHE_DIR";

const REDACTED: &str = "********";

/// Keys accepted by [`Config::set`].
pub const KEYS: [&str; 10] = [
    "remote.git_url",
    "remote.git_token",
    "remote.username",
    "remote.branch",
    "remote.author_email",
    "remote.depth",
    "paths.vault",
    "paths.cache_dir",
    "paths.notes_dir",
    "paths.assets_dir",
];

/// pagesync configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Publishing remote.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Local locations.
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load config from a TOML file, or defaults if it does not exist.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to a TOML file, creating its directory.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Default location of the config file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_DIR_ENV)
            .map_or_else(|| home().join(".config").join("pagesync"), PathBuf::from)
            .join("config.toml")
    }

    /// Set `key` (one of [`KEYS`]) from its string form.
    ///
    /// # Errors
    /// Returns error if the key is unknown or the value does not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let remote = &mut self.remote;
        let paths = &mut self.paths;
        match key {
            "remote.git_url" => remote.git_url = value.to_owned(),
            "remote.git_token" => remote.git_token = value.to_owned(),
            "remote.username" => remote.username = value.to_owned(),
            "remote.branch" => remote.branch = value.to_owned(),
            "remote.author_email" => remote.author_email = value.to_owned(),
            "remote.depth" => {
                remote.depth = value.parse().map_err(|e: std::num::ParseIntError| {
                    Error::InvalidConfigValue {
                        key: key.to_owned(),
                        message: e.to_string(),
                    }
                })?;
            }
            "paths.vault" => paths.vault = PathBuf::from(value),
            "paths.cache_dir" => {
                paths.cache_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "paths.notes_dir" => paths.notes_dir = PathBuf::from(value),
            "paths.assets_dir" => paths.assets_dir = PathBuf::from(value),
            _ => return Err(Error::UnknownConfigKey(key.to_owned())),
        }
        Ok(())
    }

    /// Check that everything a sync needs is present.
    ///
    /// # Errors
    /// Returns `MissingConfig` naming the first empty value.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("remote.git_url", &self.remote.git_url),
            ("remote.git_token", &self.remote.git_token),
            ("remote.username", &self.remote.username),
            ("remote.branch", &self.remote.branch),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::MissingConfig(key));
            }
        }
        Ok(())
    }

    /// A copy safe to display, with the token masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.remote.git_token.is_empty() {
            REDACTED.clone_into(&mut copy.remote.git_token);
        }
        copy
    }
}

/// Publishing remote settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// HTTPS URL of the site repository.
    #[serde(default)]
    pub git_url: String,

    /// Personal access token sent as the basic-auth username.
    #[serde(default)]
    pub git_token: String,

    /// Commit author name.
    #[serde(default)]
    pub username: String,

    /// Branch to clone and push.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Commit author email.
    #[serde(default = "default_author_email")]
    pub author_email: String,

    /// Clone depth; 0 fetches full history.
    #[serde(default = "default_depth")]
    pub depth: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            git_url: String::new(),
            git_token: String::new(),
            username: String::new(),
            branch: default_branch(),
            author_email: default_author_email(),
            depth: default_depth(),
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("git_url", &self.git_url)
            .field("git_token", &REDACTED)
            .field("username", &self.username)
            .field("branch", &self.branch)
            .field("author_email", &self.author_email)
            .field("depth", &self.depth)
            .finish()
    }
}

fn default_branch() -> String {
    "main".into()
}

fn default_author_email() -> String {
    "mobile@pagesync.local".into()
}

const fn default_depth() -> u32 {
    1
}

/// Local locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Notes folder to publish from.
    #[serde(default = "default_vault")]
    pub vault: PathBuf,

    /// Where the working tree is kept between syncs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Documents root inside the working tree.
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,

    /// Assets root inside the working tree.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            vault: default_vault(),
            cache_dir: None,
            notes_dir: default_notes_dir(),
            assets_dir: default_assets_dir(),
        }
    }
}

impl PathsConfig {
    /// The configured cache directory, else `$PAGESYNC_CACHE_DIR`, else
    /// `~/.cache/pagesync`.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        std::env::var_os(CACHE_DIR_ENV)
            .map_or_else(|| home().join(".cache").join("pagesync"), PathBuf::from)
    }
}

fn default_vault() -> PathBuf {
    PathBuf::from(".")
}

fn default_notes_dir() -> PathBuf {
    PathBuf::from("src/notes")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("public/images")
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
