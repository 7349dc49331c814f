//! Source documents and the embeds they reference.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::frontmatter::{self, Frontmatter};

/// `![[target]]`, `![[target|alias]]`, `![[target#heading]]`
#[allow(clippy::expect_used)]
static WIKI_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[\[([^\]|#]+)(?:#[^\]|]*)?(?:\|[^\]]*)?\]\]").expect("valid regex literal")
});

/// `![alt](target)`, `![alt](<target with spaces>)`, `![alt](target "title")`
#[allow(clippy::expect_used)]
static MARKDOWN_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[[^\]]*\]\(\s*(?:<([^>]+)>|([^)\s]+))(?:\s+"[^"]*")?\s*\)"#)
        .expect("valid regex literal")
});

/// A file in the source store, addressed relative to the store root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    /// Wrap a store-relative path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store-relative path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name including extension.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Lower-cased extension without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Folder containing the file, empty at the store root.
    #[must_use]
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Everything the pipeline needs to know about one document, captured at
/// read time.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub source: SourceFile,
    pub frontmatter: Frontmatter,
    pub body: String,
    /// Link targets of embeds in the body, in order of appearance.
    pub embeds: Vec<String>,
}

impl DocumentContext {
    /// Build the context for `source` from its raw text.
    ///
    /// # Errors
    /// Returns `InvalidFrontmatter` if the frontmatter block cannot be parsed.
    pub fn parse(source: SourceFile, content: &str) -> Result<Self> {
        let (frontmatter, body) =
            frontmatter::parse(content).map_err(|e| Error::InvalidFrontmatter {
                file: source.path().to_path_buf(),
                message: e.to_string(),
            })?;
        let embeds = embeds(&body);
        Ok(Self {
            source,
            frontmatter,
            body,
            embeds,
        })
    }
}

/// Extract embed targets from markdown, deduplicated, in order of appearance.
///
/// Remote URLs and data URIs are not embeds of local files and are skipped.
#[must_use]
pub fn embeds(markdown: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = WIKI_EMBED
        .captures_iter(markdown)
        .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.as_str().trim().to_owned())))
        .collect();

    found.extend(MARKDOWN_EMBED.captures_iter(markdown).filter_map(|c| {
        let target = c.get(1).or_else(|| c.get(2))?.as_str().trim();
        if target.contains("://") || target.starts_with("data:") {
            return None;
        }
        Some((c.get(0)?.start(), percent_decode(target)))
    }));

    found.sort_by_key(|(start, _)| *start);

    let mut out: Vec<String> = Vec::with_capacity(found.len());
    for (_, target) in found {
        if !target.is_empty() && !out.contains(&target) {
            out.push(target);
        }
    }
    out
}

/// Decode `%XX` escapes; malformed escapes are kept as-is.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| input.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        if let Some(byte) = escaped {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
