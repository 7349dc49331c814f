//! A working tree bound to its remote, author and credentials.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::Oid;
use pagesync_http::{BufferedHttp, CredentialCallback};

use crate::error::Result;
use crate::remote::{Author, RemoteSpec};
use crate::repository::{PullOutcome, Repository};
use crate::traits::GitOps;
use crate::transport::{self, SessionGuard};

/// The local working tree of the publishing remote.
///
/// Credentials are never written to the repository config or the remote URL.
/// The transport installed by [`Workspace::with_transport`] asks the callback
/// for them on every request.
pub struct Workspace {
    workdir: PathBuf,
    remote: RemoteSpec,
    author: Author,
    credentials: Option<CredentialCallback>,
    session: Option<SessionGuard>,
}

impl Workspace {
    /// Create a workspace for `remote` at `workdir`.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>, remote: RemoteSpec, author: Author) -> Self {
        Self {
            workdir: workdir.into(),
            remote,
            author,
            credentials: None,
            session: None,
        }
    }

    /// Supply credentials on demand for clone, pull and push.
    ///
    /// Must be called before [`Workspace::with_transport`], which captures them.
    #[must_use]
    pub fn with_credentials(mut self, credentials: CredentialCallback) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Route HTTP(S) remotes through `http` for the lifetime of the workspace.
    ///
    /// # Errors
    /// Returns `SyncInProgress` if another workspace holds the transport.
    pub fn with_transport(mut self, http: Arc<dyn BufferedHttp>) -> Result<Self> {
        self.session = Some(transport::activate(http, self.credentials.clone())?);
        Ok(self)
    }

    /// The remote this workspace publishes to.
    #[must_use]
    pub const fn remote(&self) -> &RemoteSpec {
        &self.remote
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.workdir)
    }
}

impl GitOps for Workspace {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn clone_remote(&self) -> Result<()> {
        tracing::info!(
            url = %self.remote.url,
            branch = %self.remote.branch,
            depth = self.remote.depth,
            "cloning"
        );
        Repository::clone_remote(&self.remote, &self.workdir)?;
        Ok(())
    }

    fn pull(&self) -> Result<PullOutcome> {
        tracing::info!(url = %self.remote.url, branch = %self.remote.branch, "pulling");
        self.open()?.pull_ff(&self.remote)
    }

    fn stage_all(&self) -> Result<()> {
        self.open()?.stage_all()
    }

    fn create_commit(&self, message: &str) -> Result<Oid> {
        self.open()?.create_commit(&self.author, message)
    }

    fn push(&self) -> Result<()> {
        tracing::info!(url = %self.remote.url, branch = %self.remote.branch, "pushing");
        self.open()?.push(&self.remote)
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("workdir", &self.workdir)
            .field("remote", &self.remote)
            .field("author", &self.author)
            .field("credentials", &self.credentials.as_ref().map(|_| "[REDACTED]"))
            .field("transport", &self.session.is_some())
            .finish()
    }
}
