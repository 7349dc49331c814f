//! Trait abstractions for the note store being published.
//!
//! This module defines the `SourceStore` trait which abstracts where notes and
//! their attachments come from, enabling dependency injection and testability.

use crate::Result;
use crate::document::SourceFile;

/// Trait for reading notes and attachments.
///
/// This trait abstracts the source of published content, allowing for:
/// - A directory-backed vault in the CLI
/// - In-memory stores in tests
#[allow(clippy::missing_errors_doc)]
pub trait SourceStore {
    /// All markdown documents, in path order.
    fn documents(&self) -> Result<Vec<SourceFile>>;

    /// Read a document as text.
    fn read_text(&self, file: &SourceFile) -> Result<String>;

    /// Read any file as bytes.
    fn read_binary(&self, file: &SourceFile) -> Result<Vec<u8>>;

    /// Resolve an embed target as seen from `from`. Unresolvable links yield
    /// `None`.
    fn resolve_link(&self, link: &str, from: &SourceFile) -> Option<SourceFile>;
}
