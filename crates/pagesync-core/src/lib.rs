//! # pagesync-core
//!
//! Core library for pagesync: the virtual filesystem and directory ensurer,
//! the vault source store, frontmatter and summary handling, the content
//! staging pipeline and the sync engine that publishes it.

pub mod config;
pub mod document;
pub mod ensure;
pub mod error;
pub mod frontmatter;
pub mod staging;
pub mod summary;
pub mod sync;
pub mod traits;
pub mod vault;
pub mod vfs;

pub use config::Config;
pub use document::{DocumentContext, SourceFile};
pub use ensure::ensure_dir;
pub use error::{Error, Result};
pub use staging::{Layout, StagingPipeline, StagingReport};
pub use sync::{InitMode, SyncEngine, SyncPhase, SyncReport};
pub use traits::SourceStore;
pub use vault::Vault;
pub use vfs::{DiskFs, Vfs};
