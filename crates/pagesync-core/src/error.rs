//! Error types for pagesync-core.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pagesync-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Another sync of the same working tree is running.
    #[error("sync already in progress for {0}")]
    SyncInProgress(PathBuf),

    /// A document's frontmatter block is not valid YAML or not a mapping.
    #[error("invalid frontmatter in {file}: {message}")]
    InvalidFrontmatter { file: PathBuf, message: String },

    /// A `SpecTag` would place the document outside the documents root.
    #[error("invalid SpecTag '{tag}' in {file} - tags must be relative folder names")]
    InvalidTag { tag: String, file: PathBuf },

    /// A required configuration value is empty.
    #[error("missing configuration value '{0}' - run `pagesync config set {0} <value>`")]
    MissingConfig(&'static str),

    /// Unknown key passed to `config set`.
    #[error("unknown configuration key '{0}'")]
    UnknownConfigKey(String),

    /// A configuration value could not be parsed.
    #[error("invalid value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("toml error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Git operation error.
    #[error("git error: {0}")]
    Git(#[from] pagesync_git::Error),
}
