//! Directory-backed note store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::document::SourceFile;
use crate::error::Result;
use crate::traits::SourceStore;
use crate::vfs::normalize;

/// A folder of markdown notes and attachments.
///
/// The file list is captured when the vault is opened. Hidden files and
/// folders (such as `.obsidian` or `.git`) are ignored.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl Vault {
    /// Index the vault at `root`.
    ///
    /// # Errors
    /// Returns error if `root` cannot be walked.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut files = Vec::new();

        for entry in WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&root) {
                files.push(relative.to_path_buf());
            }
        }
        files.sort();

        tracing::debug!(root = %root.display(), files = files.len(), "indexed vault");
        Ok(Self { root, files })
    }

    fn contains(&self, path: &Path) -> bool {
        self.files.binary_search_by(|f| f.as_path().cmp(path)).is_ok()
    }

    fn resolve_path(&self, link: &Path, from: &SourceFile) -> Option<SourceFile> {
        let relative = normalize(&from.folder().join(link));
        let absolute = normalize(link);
        if let Some(hit) = [relative, absolute.clone()]
            .into_iter()
            .find(|candidate| self.contains(candidate))
        {
            return Some(SourceFile::new(hit));
        }

        // Shortest match by trailing path components, same folder first.
        self.files
            .iter()
            .filter(|f| f.ends_with(&absolute))
            .min_by_key(|f| (f.parent() != Some(from.folder()), f.components().count()))
            .map(SourceFile::new)
    }
}

impl SourceStore for Vault {
    fn documents(&self) -> Result<Vec<SourceFile>> {
        Ok(self
            .files
            .iter()
            .map(SourceFile::new)
            .filter(|f| f.extension().as_deref() == Some("md"))
            .collect())
    }

    fn read_text(&self, file: &SourceFile) -> Result<String> {
        Ok(fs::read_to_string(self.root.join(file.path()))?)
    }

    fn read_binary(&self, file: &SourceFile) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(file.path()))?)
    }

    fn resolve_link(&self, link: &str, from: &SourceFile) -> Option<SourceFile> {
        let link = link.trim().trim_start_matches('/');
        if link.is_empty() {
            return None;
        }

        let path = Path::new(link);
        self.resolve_path(path, from).or_else(|| {
            if path.extension().is_some() {
                return None;
            }
            self.resolve_path(&path.with_extension("md"), from)
        })
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}
