//! Repository wrapper providing the clone/pull/add/commit/push cycle.

use std::cell::RefCell;
use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{ErrorCode, FetchOptions, IndexAddOption, Oid, PushOptions, RemoteCallbacks};

use crate::error::{Error, Result};
use crate::remote::{Author, RemoteSpec};

/// Name of the remote created by [`Repository::clone_remote`].
pub const REMOTE_NAME: &str = "origin";

/// What a pull did to the local branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Local branch already contained the remote tip.
    UpToDate,
    /// Local branch was moved forward to the given commit.
    FastForwarded(Oid),
}

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
}

impl Repository {
    /// Open the repository whose working tree is exactly `path`.
    ///
    /// Parent directories are not searched, so a cache directory nested in
    /// some other checkout is never mistaken for it.
    ///
    /// # Errors
    /// Returns error if `path` is not a repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = git2::Repository::open(path)
            .map_err(|_| Error::NotARepository(path.display().to_string()))?;
        Ok(Self { inner })
    }

    /// Clone the configured branch of `spec` into `path`.
    ///
    /// Only the configured branch is fetched, and only `spec.depth` commits of
    /// history when the depth is non-zero. HTTP(S) credentials are attached by
    /// the registered transport, not here.
    ///
    /// # Errors
    /// Returns `AuthenticationFailed` if the remote rejects the credentials,
    /// `CloneFailed` for any other failure.
    pub fn clone_remote(spec: &RemoteSpec, path: &Path) -> Result<Self> {
        let mut fetch = FetchOptions::new();
        if spec.depth > 0 {
            fetch.depth(i32::try_from(spec.depth).unwrap_or(i32::MAX));
        }

        let refspec = spec.fetch_refspec();
        let mut builder = RepoBuilder::new();
        builder
            .branch(&spec.branch)
            .fetch_options(fetch)
            .remote_create(move |repo, name, url| repo.remote_with_fetch(name, url, &refspec));

        let inner = builder
            .clone(&spec.url, path)
            .map_err(|e| Error::from_network(&e, Error::CloneFailed))?;
        Ok(Self { inner })
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// Stage every new and modified path in the working tree.
    ///
    /// # Errors
    /// Returns error if the index cannot be updated.
    pub fn stage_all(&self) -> Result<()> {
        let mut index = self.inner.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }

    // === Commit operations ===

    /// Commit the index on top of HEAD (or as a root commit on an unborn
    /// branch).
    ///
    /// # Errors
    /// Returns error if the author is invalid or the commit cannot be written.
    pub fn create_commit(&self, author: &Author, message: &str) -> Result<Oid> {
        let signature = author.signature()?;
        let tree_id = self.inner.index()?.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let parent = match self.inner.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self.inner.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(oid)
    }

    // === Remote operations ===

    /// Fetch the configured branch and fast-forward the local branch to it.
    ///
    /// # Errors
    /// Returns `NotFastForward` if local and remote history diverged,
    /// `AuthenticationFailed`/`FetchFailed` if the fetch fails.
    pub fn pull_ff(&self, spec: &RemoteSpec) -> Result<PullOutcome> {
        let mut remote = self
            .inner
            .find_remote(REMOTE_NAME)
            .map_err(|_| Error::RemoteNotFound(REMOTE_NAME.into()))?;

        remote
            .fetch(&[spec.branch.as_str()], Some(&mut FetchOptions::new()), None)
            .map_err(|e| Error::from_network(&e, Error::FetchFailed))?;

        let fetch_head = self.inner.find_reference("FETCH_HEAD")?;
        let incoming = self.inner.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = self.inner.merge_analysis(&[&incoming])?;

        if analysis.is_up_to_date() {
            return Ok(PullOutcome::UpToDate);
        }
        if !(analysis.is_fast_forward() || analysis.is_unborn()) {
            return Err(Error::NotFastForward(spec.branch.clone()));
        }

        let target = incoming.id();
        let refname = format!("refs/heads/{}", spec.branch);
        let message = format!("pagesync: fast-forward to {target}");
        match self.inner.find_reference(&refname) {
            Ok(mut reference) => {
                reference.set_target(target, &message)?;
            }
            Err(_) => {
                self.inner.reference(&refname, target, true, &message)?;
            }
        }
        self.inner.set_head(&refname)?;
        self.inner
            .checkout_head(Some(CheckoutBuilder::default().force()))?;

        Ok(PullOutcome::FastForwarded(target))
    }

    /// Push the configured branch.
    ///
    /// # Errors
    /// Returns `AuthenticationFailed` if the credentials are rejected,
    /// `PushFailed` if the push fails or the remote refuses the update.
    pub fn push(&self, spec: &RemoteSpec) -> Result<()> {
        let mut remote = self
            .inner
            .find_remote(REMOTE_NAME)
            .map_err(|_| Error::RemoteNotFound(REMOTE_NAME.into()))?;

        let rejection: RefCell<Option<String>> = RefCell::new(None);
        {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.push_update_reference(|refname, status| {
                if let Some(msg) = status {
                    *rejection.borrow_mut() = Some(format!("{refname}: {msg}"));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote
                .push(&[spec.push_refspec()], Some(&mut options))
                .map_err(|e| Error::from_network(&e, Error::PushFailed))?;
        }

        if let Some(message) = rejection.into_inner() {
            return Err(Error::PushFailed(message));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}
