//! Recursive directory creation over a [`Vfs`].

use std::io;
use std::path::Path;

use crate::vfs::{EntryKind, Vfs, is_root, normalize};

/// Make sure `path` and all of its ancestors exist as directories.
///
/// Existing directories are left alone, so calling this repeatedly is a
/// no-op. A directory created concurrently between the check and the create
/// counts as success.
///
/// # Errors
/// Returns `NotADirectory` if `path` or an ancestor is a file, or the
/// underlying error if a create fails for another reason.
pub fn ensure_dir<F: Vfs + ?Sized>(fs: &F, path: &Path) -> io::Result<()> {
    let target = normalize(path);
    if is_root(&target) {
        return Ok(());
    }

    match fs.stat(&target) {
        Ok(EntryKind::Dir) => return Ok(()),
        Ok(EntryKind::File) => {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} exists and is not a directory", target.display()),
            ));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Some(parent) = target.parent() {
        ensure_dir(fs, parent)?;
    }

    match fs.mkdir(&target) {
        Ok(()) => {
            tracing::trace!(path = %target.display(), "created directory");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::vfs::memory::MemoryFs;

    /// Loses every stat race: reports `NotFound` once, then behaves normally.
    struct RacingFs {
        inner: MemoryFs,
        raced: std::cell::Cell<bool>,
    }

    impl Vfs for RacingFs {
        fn stat(&self, path: &Path) -> io::Result<EntryKind> {
            if !self.raced.get() {
                self.raced.set(true);
                return Err(io::Error::new(io::ErrorKind::NotFound, "not yet"));
            }
            self.inner.stat(path)
        }

        fn mkdir(&self, path: &Path) -> io::Result<()> {
            self.inner.mkdir(path)
        }

        fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
            self.inner.write_file(path, data)
        }

        fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.inner.read_file(path)
        }
    }

    #[test]
    fn test_creates_missing_ancestors_in_order() {
        let fs = MemoryFs::new();

        ensure_dir(&fs, Path::new("/repo/src/notes/guides")).unwrap();

        assert_eq!(
            fs.mkdir_calls(),
            vec![
                PathBuf::from("/repo"),
                PathBuf::from("/repo/src"),
                PathBuf::from("/repo/src/notes"),
                PathBuf::from("/repo/src/notes/guides"),
            ]
        );
        assert_eq!(
            fs.stat(Path::new("/repo/src/notes/guides")).unwrap(),
            EntryKind::Dir
        );
    }

    #[test]
    fn test_existing_directory_is_noop() {
        let fs = MemoryFs::new();
        ensure_dir(&fs, Path::new("/repo/src")).unwrap();
        let calls = fs.mkdir_calls().len();

        ensure_dir(&fs, Path::new("/repo/src")).unwrap();
        ensure_dir(&fs, Path::new("/repo")).unwrap();

        assert_eq!(fs.mkdir_calls().len(), calls);
    }

    #[test]
    fn test_root_needs_nothing() {
        let fs = MemoryFs::new();
        ensure_dir(&fs, Path::new("/")).unwrap();
        assert!(fs.mkdir_calls().is_empty());
    }

    #[test]
    fn test_normalizes_path() {
        let fs = MemoryFs::new();
        ensure_dir(&fs, Path::new("/repo/./src//notes/../images/")).unwrap();

        assert_eq!(
            fs.stat(Path::new("/repo/src/images")).unwrap(),
            EntryKind::Dir
        );
        assert!(fs.stat(Path::new("/repo/src/notes")).is_err());
    }

    #[test]
    fn test_file_in_the_way() {
        let fs = MemoryFs::new();
        ensure_dir(&fs, Path::new("/repo")).unwrap();
        fs.write_file(Path::new("/repo/src"), b"oops").unwrap();

        let err = ensure_dir(&fs, Path::new("/repo/src/notes")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotADirectory);

        let err = ensure_dir(&fs, Path::new("/repo/src")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotADirectory);
    }

    #[test]
    fn test_concurrent_create_counts_as_success() {
        let inner = MemoryFs::new();
        inner.mkdir(Path::new("/repo")).unwrap();
        let fs = RacingFs {
            inner,
            raced: std::cell::Cell::new(false),
        };

        // First stat claims /repo is missing; mkdir then reports AlreadyExists.
        ensure_dir(&fs, Path::new("/repo")).unwrap();
        assert_eq!(fs.stat(Path::new("/repo")).unwrap(), EntryKind::Dir);
    }
}
