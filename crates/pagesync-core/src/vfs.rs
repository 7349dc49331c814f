//! Virtual filesystem addressed by POSIX-style absolute paths.
//!
//! The staging pipeline and the ensurer only talk to [`Vfs`]; the CLI backs it
//! with [`DiskFs`], which maps virtual `/` onto a cache directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Kind of an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Minimal filesystem surface needed for staging.
///
/// `mkdir` creates exactly one level: it fails with `NotFound` when the parent
/// is missing and `AlreadyExists` when the entry is present.
pub trait Vfs {
    /// Describe the entry at `path`.
    ///
    /// # Errors
    /// Returns `NotFound` if nothing exists at `path`.
    fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Create a single directory.
    ///
    /// # Errors
    /// Returns `AlreadyExists` or `NotFound` as described on the trait.
    fn mkdir(&self, path: &Path) -> io::Result<()>;

    /// Create or replace a file.
    ///
    /// # Errors
    /// Returns error if the parent directory is missing or the write fails.
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Read a whole file.
    ///
    /// # Errors
    /// Returns error if the file is missing or unreadable.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Whether any entry exists at `path`.
    ///
    /// # Errors
    /// Returns error for failures other than `NotFound`.
    fn exists(&self, path: &Path) -> io::Result<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Lexically normalize `path`: drop `.` and empty segments, resolve `..`.
///
/// `..` never climbs above the root of an absolute path.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Whether `path` names the filesystem root (or nothing at all).
#[must_use]
pub fn is_root(path: &Path) -> bool {
    path.as_os_str().is_empty() || path.parent().is_none()
}

/// [`Vfs`] backed by a directory on the host.
#[derive(Debug, Clone)]
pub struct DiskFs {
    base: PathBuf,
}

impl DiskFs {
    /// Use `base` as the virtual root, creating it if needed.
    ///
    /// # Errors
    /// Returns error if `base` cannot be created.
    pub fn open(base: impl Into<PathBuf>) -> io::Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// The host directory standing in for virtual `/`.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Map a virtual path onto the host.
    #[must_use]
    pub fn host_path(&self, path: &Path) -> PathBuf {
        let mut host = self.base.clone();
        for component in normalize(path).components() {
            if let Component::Normal(part) = component {
                host.push(part);
            }
        }
        host
    }

    /// Remove everything under the virtual root. Returns whether anything was
    /// there.
    ///
    /// # Errors
    /// Returns error if an entry cannot be removed.
    pub fn wipe(&self) -> io::Result<bool> {
        let mut removed = false;
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
            removed = true;
        }
        Ok(removed)
    }
}

impl Vfs for DiskFs {
    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let meta = fs::metadata(self.host_path(path))?;
        Ok(if meta.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        })
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(self.host_path(path))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        fs::write(self.host_path(path), data)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(self.host_path(path))
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b//c/")), PathBuf::from("/a/b/c"));
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_is_root() {
        assert!(is_root(Path::new("/")));
        assert!(is_root(Path::new("")));
        assert!(!is_root(Path::new("/repo")));
    }

    #[test]
    fn test_host_path_stays_under_base() {
        let temp = TempDir::new().unwrap();
        let fs = DiskFs::open(temp.path().join("store")).unwrap();

        assert_eq!(fs.host_path(Path::new("/")), fs.base());
        assert_eq!(
            fs.host_path(Path::new("/repo/src/notes")),
            fs.base().join("repo/src/notes")
        );
        assert_eq!(
            fs.host_path(Path::new("/repo/../../etc")),
            fs.base().join("etc")
        );
    }

    #[test]
    fn test_mkdir_is_single_level() {
        let temp = TempDir::new().unwrap();
        let fs = DiskFs::open(temp.path()).unwrap();

        let err = fs.mkdir(Path::new("/a/b")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs.mkdir(Path::new("/a")).unwrap();
        let err = fs.mkdir(Path::new("/a")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs.stat(Path::new("/a")).unwrap(), EntryKind::Dir);
    }

    #[test]
    fn test_write_and_read() {
        let temp = TempDir::new().unwrap();
        let fs = DiskFs::open(temp.path()).unwrap();

        fs.write_file(Path::new("/note.md"), b"hello").unwrap();

        assert_eq!(fs.read_file(Path::new("/note.md")).unwrap(), b"hello");
        assert_eq!(fs.stat(Path::new("/note.md")).unwrap(), EntryKind::File);
        assert!(fs.exists(Path::new("/note.md")).unwrap());
        assert!(!fs.exists(Path::new("/other.md")).unwrap());
    }

    #[test]
    fn test_wipe() {
        let temp = TempDir::new().unwrap();
        let fs = DiskFs::open(temp.path().join("store")).unwrap();
        assert!(!fs.wipe().unwrap());

        fs.mkdir(Path::new("/repo")).unwrap();
        fs.write_file(Path::new("/repo/a.md"), b"a").unwrap();
        fs.write_file(Path::new("/top.txt"), b"t").unwrap();

        assert!(fs.wipe().unwrap());
        assert!(fs.base().exists());
        assert!(!fs.exists(Path::new("/repo")).unwrap());
        assert!(!fs.exists(Path::new("/top.txt")).unwrap());
    }
}
