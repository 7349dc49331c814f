//! Content staging: turning published notes into site files.
//!
//! For every document in the source store the pipeline
//! 1. skips it unless `Published` is set,
//! 2. fills in `desc` from the body when missing,
//! 3. picks the folder from `SpecTag` (default `Uncategorized`),
//! 4. copies embedded images into the shared assets folder,
//! 5. writes the rewritten document under the documents root.
//!
//! Documents are processed one at a time in path order; the first failure
//! stops the run. A document that is not valid UTF-8, or whose frontmatter
//! does not parse and does not declare `Published`, counts as unpublished.

use std::io;
use std::path::{Component, Path, PathBuf};

use serde_yaml::Value;

use crate::document::{DocumentContext, SourceFile};
use crate::ensure::ensure_dir;
use crate::error::{Error, Result};
use crate::frontmatter::{self, DESC, PUBLISHED};
use crate::summary::summarize;
use crate::traits::SourceStore;
use crate::vfs::Vfs;

/// Folder for published documents without a `SpecTag`.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Extensions copied as image assets (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Where staged content lands inside the virtual filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    repo_root: PathBuf,
    notes_dir: PathBuf,
    assets_dir: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new("src/notes", "public/images")
    }
}

impl Layout {
    /// Working tree root in the virtual filesystem.
    pub const REPO_ROOT: &'static str = "/repo";

    /// Layout with the given documents and assets folders, relative to the
    /// working tree.
    #[must_use]
    pub fn new(notes_dir: impl AsRef<Path>, assets_dir: impl AsRef<Path>) -> Self {
        let repo_root = PathBuf::from(Self::REPO_ROOT);
        Self {
            notes_dir: repo_root.join(relative(notes_dir.as_ref())),
            assets_dir: repo_root.join(relative(assets_dir.as_ref())),
            repo_root,
        }
    }

    /// Working tree root.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Documents root.
    #[must_use]
    pub fn notes_root(&self) -> &Path {
        &self.notes_dir
    }

    /// Assets root.
    #[must_use]
    pub fn assets_root(&self) -> &Path {
        &self.assets_dir
    }

    /// Folder for documents tagged `tag`.
    ///
    /// Returns `None` if the tag is not a plain relative path.
    #[must_use]
    pub fn tag_dir(&self, tag: &str) -> Option<PathBuf> {
        let tag = Path::new(tag);
        let mut components = tag.components().peekable();
        components.peek()?;
        components
            .all(|c| matches!(c, Component::Normal(_)))
            .then(|| self.notes_dir.join(tag))
    }
}

/// Keep only the plain components so the path joins under the repo.
fn relative(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// A document written by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDocument {
    pub source: SourceFile,
    pub destination: PathBuf,
    pub tag: String,
    /// Asset paths written for this document.
    pub assets: Vec<PathBuf>,
    /// Whether `desc` was generated from the body.
    pub generated_summary: bool,
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Skipped,
    Staged(StagedDocument),
}

/// Summary of a staging run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    pub staged: Vec<StagedDocument>,
    pub skipped: usize,
}

impl StagingReport {
    /// Number of asset files written.
    #[must_use]
    pub fn assets_copied(&self) -> usize {
        self.staged.iter().map(|d| d.assets.len()).sum()
    }
}

/// Stages every published document from a [`SourceStore`] into a [`Vfs`].
pub struct StagingPipeline<'a, S: ?Sized, F: ?Sized> {
    source: &'a S,
    fs: &'a F,
    layout: &'a Layout,
}

impl<'a, S: SourceStore + ?Sized, F: Vfs + ?Sized> StagingPipeline<'a, S, F> {
    #[must_use]
    pub const fn new(source: &'a S, fs: &'a F, layout: &'a Layout) -> Self {
        Self { source, fs, layout }
    }

    /// Stage all documents.
    ///
    /// # Errors
    /// Stops at the first document that cannot be read, parsed or written.
    pub fn run(&self) -> Result<StagingReport> {
        ensure_dir(self.fs, self.layout.notes_root())?;
        ensure_dir(self.fs, self.layout.assets_root())?;

        let mut report = StagingReport::default();
        for file in self.source.documents()? {
            let Some(ctx) = self.load(&file)? else {
                report.skipped += 1;
                continue;
            };
            match self.stage_document(&ctx)? {
                DocumentOutcome::Skipped => report.skipped += 1,
                DocumentOutcome::Staged(doc) => report.staged.push(doc),
            }
        }

        tracing::info!(
            staged = report.staged.len(),
            skipped = report.skipped,
            assets = report.assets_copied(),
            "staging complete"
        );
        Ok(report)
    }

    /// Read and parse `file`, or `None` if it is unreadable and cannot be a
    /// published document.
    fn load(&self, file: &SourceFile) -> Result<Option<DocumentContext>> {
        let content = match self.source.read_text(file) {
            Ok(content) => content,
            Err(Error::Io(err)) if err.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(file = %file.path().display(), "not valid UTF-8, skipping");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        match DocumentContext::parse(file.clone(), &content) {
            Ok(ctx) => Ok(Some(ctx)),
            Err(err @ Error::InvalidFrontmatter { .. })
                if !frontmatter::declares_published(&content) =>
            {
                tracing::warn!(error = %err, "invalid frontmatter without Published, skipping");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Stage a single document.
    ///
    /// # Errors
    /// Returns `InvalidTag` for tags escaping the documents root, or the
    /// underlying error if an asset or the document cannot be written.
    pub fn stage_document(&self, ctx: &DocumentContext) -> Result<DocumentOutcome> {
        if !ctx.frontmatter.is_published() {
            match ctx.frontmatter.get(PUBLISHED) {
                None | Some(Value::Null | Value::Bool(false)) => {
                    tracing::debug!(
                        file = %ctx.source.path().display(),
                        "not published, skipping"
                    );
                }
                Some(value) => {
                    tracing::warn!(
                        file = %ctx.source.path().display(),
                        ?value,
                        "Published is neither true nor \"True\", skipping"
                    );
                }
            }
            return Ok(DocumentOutcome::Skipped);
        }

        let mut frontmatter = ctx.frontmatter.clone();
        let generated_summary = frontmatter.needs_summary();
        if generated_summary {
            frontmatter.insert(DESC, summarize(&ctx.body));
        }

        let tag = frontmatter
            .spec_tag()
            .unwrap_or_else(|| UNCATEGORIZED.to_owned());
        let folder = self.layout.tag_dir(&tag).ok_or_else(|| Error::InvalidTag {
            tag: tag.clone(),
            file: ctx.source.path().to_path_buf(),
        })?;
        ensure_dir(self.fs, &folder)?;

        let assets = self.copy_assets(ctx)?;

        let destination = folder.join(ctx.source.name());
        let rendered = frontmatter::stringify(&ctx.body, &frontmatter)?;
        self.fs.write_file(&destination, rendered.as_bytes())?;

        tracing::debug!(
            file = %ctx.source.path().display(),
            destination = %destination.display(),
            assets = assets.len(),
            "staged"
        );
        Ok(DocumentOutcome::Staged(StagedDocument {
            source: ctx.source.clone(),
            destination,
            tag,
            assets,
            generated_summary,
        }))
    }

    fn copy_assets(&self, ctx: &DocumentContext) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for link in &ctx.embeds {
            let Some(file) = self.source.resolve_link(link, &ctx.source) else {
                tracing::warn!(
                    file = %ctx.source.path().display(),
                    link = %link,
                    "unresolved embed"
                );
                continue;
            };
            if !is_image(&file) {
                continue;
            }

            let data = self.source.read_binary(&file)?;
            let destination = self.layout.assets_root().join(file.name());
            self.fs.write_file(&destination, &data)?;
            written.push(destination);
        }
        Ok(written)
    }
}

/// Whether `file` has one of the [`IMAGE_EXTENSIONS`].
#[must_use]
pub fn is_image(file: &SourceFile) -> bool {
    file.extension()
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::vfs::memory::MemoryFs;

    /// Source store over in-memory files, resolving links by exact name.
    #[derive(Default)]
    struct MemoryStore {
        files: BTreeMap<String, Vec<u8>>,
    }

    impl MemoryStore {
        fn with(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
            self.files.insert(path.to_owned(), content.as_ref().to_vec());
            self
        }
    }

    impl SourceStore for MemoryStore {
        fn documents(&self) -> Result<Vec<SourceFile>> {
            Ok(self
                .files
                .keys()
                .filter(|k| k.ends_with(".md"))
                .map(SourceFile::new)
                .collect())
        }

        fn read_text(&self, file: &SourceFile) -> Result<String> {
            String::from_utf8(self.read_binary(file)?)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
        }

        fn read_binary(&self, file: &SourceFile) -> Result<Vec<u8>> {
            self.files
                .get(file.path().to_str().unwrap())
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound).into())
        }

        fn resolve_link(&self, link: &str, _from: &SourceFile) -> Option<SourceFile> {
            self.files
                .keys()
                .find(|k| k.as_str() == link || k.ends_with(&format!("/{link}")))
                .map(SourceFile::new)
        }
    }

    fn text(fs: &MemoryFs, path: &str) -> String {
        String::from_utf8(fs.file(path).unwrap()).unwrap()
    }

    #[test]
    fn test_layout_paths() {
        let layout = Layout::default();
        assert_eq!(layout.repo_root(), Path::new("/repo"));
        assert_eq!(layout.notes_root(), Path::new("/repo/src/notes"));
        assert_eq!(layout.assets_root(), Path::new("/repo/public/images"));

        let custom = Layout::new("/content/posts", "static/img");
        assert_eq!(custom.notes_root(), Path::new("/repo/content/posts"));
    }

    #[test]
    fn test_tag_dir_rejects_escapes() {
        let layout = Layout::default();
        assert_eq!(
            layout.tag_dir("guides/rust"),
            Some(PathBuf::from("/repo/src/notes/guides/rust"))
        );
        assert_eq!(layout.tag_dir("../outside"), None);
        assert_eq!(layout.tag_dir("/etc"), None);
        assert_eq!(layout.tag_dir(""), None);
    }

    #[test]
    fn test_published_with_summary() {
        let store = MemoryStore::default().with(
            "a.md",
            "---\nPublished: true\nSpecTag: guides\n---\n# Hi\nHello world",
        );
        let fs = MemoryFs::new();
        let layout = Layout::default();

        let report = StagingPipeline::new(&store, &fs, &layout).run().unwrap();

        assert_eq!(report.staged.len(), 1);
        assert!(report.staged[0].generated_summary);
        assert_eq!(
            text(&fs, "/repo/src/notes/guides/a.md"),
            "---\nPublished: true\nSpecTag: guides\ndesc: Hi Hello world\n---\n# Hi\nHello world\n"
        );
    }

    #[test]
    fn test_unpublished_is_skipped() {
        let store = MemoryStore::default()
            .with("draft.md", "---\nPublished: false\n---\nbody")
            .with("plain.md", "no frontmatter");
        let fs = MemoryFs::new();
        let layout = Layout::default();

        let report = StagingPipeline::new(&store, &fs, &layout).run().unwrap();

        assert!(report.staged.is_empty());
        assert_eq!(report.skipped, 2);
        assert!(fs.file("/repo/src/notes/Uncategorized/draft.md").is_none());
        // Roots exist even when nothing is published.
        assert!(fs.exists(Path::new("/repo/src/notes")).unwrap());
        assert!(fs.exists(Path::new("/repo/public/images")).unwrap());
    }

    #[test]
    fn test_string_true_and_existing_desc() {
        let store = MemoryStore::default().with(
            "b.md",
            "---\nPublished: \"True\"\ndesc: Custom\n---\nLong body text",
        );
        let fs = MemoryFs::new();
        let layout = Layout::default();

        let report = StagingPipeline::new(&store, &fs, &layout).run().unwrap();

        assert_eq!(report.staged[0].tag, UNCATEGORIZED);
        assert!(!report.staged[0].generated_summary);
        let out = text(&fs, "/repo/src/notes/Uncategorized/b.md");
        assert!(out.contains("desc: Custom\n"));
        assert!(out.ends_with("---\nLong body text\n"));
    }

    #[test]
    fn test_images_are_copied() {
        let store = MemoryStore::default()
            .with("c.md", "---\nPublished: true\n---\n![[pic.png]] ![[doc.pdf]] ![[gone.png]]")
            .with("attachments/pic.png", [0x89, b'P', b'N', b'G'])
            .with("attachments/doc.pdf", b"pdf");
        let fs = MemoryFs::new();
        let layout = Layout::default();

        let report = StagingPipeline::new(&store, &fs, &layout).run().unwrap();

        assert_eq!(report.assets_copied(), 1);
        assert_eq!(
            fs.file("/repo/public/images/pic.png").unwrap(),
            vec![0x89, b'P', b'N', b'G']
        );
        assert!(fs.file("/repo/public/images/doc.pdf").is_none());
        assert!(fs.file("/repo/src/notes/Uncategorized/c.md").is_some());
    }

    #[test]
    fn test_image_extension_is_case_insensitive() {
        assert!(is_image(&SourceFile::new("a/Photo.JPG")));
        assert!(is_image(&SourceFile::new("x.webp")));
        assert!(!is_image(&SourceFile::new("x.svg")));
        assert!(!is_image(&SourceFile::new("png")));
    }

    #[test]
    fn test_invalid_tag_stops_run() {
        let store = MemoryStore::default()
            .with("a.md", "---\nPublished: true\nSpecTag: ../../etc\n---\nx")
            .with("b.md", "---\nPublished: true\n---\ny");
        let fs = MemoryFs::new();
        let layout = Layout::default();

        let err = StagingPipeline::new(&store, &fs, &layout).run().unwrap_err();

        assert!(matches!(err, Error::InvalidTag { ref tag, .. } if tag == "../../etc"));
        assert!(fs.file("/repo/src/notes/Uncategorized/b.md").is_none());
    }

    #[test]
    fn test_rerun_produces_identical_output() {
        let store = MemoryStore::default().with(
            "a.md",
            "---\nPublished: true\nSpecTag: guides\n---\n# Hi\nHello world",
        );
        let fs = MemoryFs::new();
        let layout = Layout::default();
        let pipeline = StagingPipeline::new(&store, &fs, &layout);

        pipeline.run().unwrap();
        let first = text(&fs, "/repo/src/notes/guides/a.md");
        pipeline.run().unwrap();

        assert_eq!(text(&fs, "/repo/src/notes/guides/a.md"), first);
    }

    #[test]
    fn test_broken_drafts_do_not_block_published_notes() {
        let store = MemoryStore::default()
            .with("pub.md", "---\nPublished: true\n---\nhello")
            .with("zz-draft.md", "---\ntitle: Notes: on: colons\nPublished: false\n---\nx")
            .with("zz-latin1.md", b"---\nPublished: true\n---\ncaf\xe9");
        let fs = MemoryFs::new();
        let layout = Layout::default();

        let report = StagingPipeline::new(&store, &fs, &layout).run().unwrap();

        assert_eq!(report.staged.len(), 1);
        assert_eq!(report.skipped, 2);
        assert!(fs.file("/repo/src/notes/Uncategorized/pub.md").is_some());
    }

    #[test]
    fn test_published_note_with_broken_frontmatter_stops_run() {
        let store = MemoryStore::default()
            .with("a.md", "---\ntitle: Notes: on: colons\nPublished: true\n---\nx")
            .with("b.md", "---\nPublished: true\n---\ny");
        let fs = MemoryFs::new();
        let layout = Layout::default();

        let err = StagingPipeline::new(&store, &fs, &layout).run().unwrap_err();

        assert!(
            matches!(err, Error::InvalidFrontmatter { ref file, .. } if file == Path::new("a.md"))
        );
        assert!(fs.file("/repo/src/notes/Uncategorized/b.md").is_none());
    }
}
