//! Remote description and commit identity.

use git2::Signature;

use crate::error::Result;

/// The remote a working tree publishes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSpec {
    /// Remote URL (`https://host/owner/repo.git` or a local path).
    pub url: String,
    /// The single branch that is cloned, pulled and pushed.
    pub branch: String,
    /// History depth for the initial clone; `0` means full history.
    pub depth: u32,
}

impl RemoteSpec {
    /// A shallow (depth 1) single-branch remote.
    #[must_use]
    pub fn new(url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            depth: 1,
        }
    }

    /// Override the clone depth.
    #[must_use]
    pub const fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Fetch refspec limiting the remote to the configured branch.
    #[must_use]
    pub fn fetch_refspec(&self) -> String {
        format!(
            "+refs/heads/{0}:refs/remotes/origin/{0}",
            self.branch
        )
    }

    /// Push refspec for the configured branch.
    #[must_use]
    pub fn push_refspec(&self) -> String {
        format!("refs/heads/{0}:refs/heads/{0}", self.branch)
    }
}

/// Commit author identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Signature stamped with the current time.
    pub(crate) fn signature(&self) -> Result<Signature<'static>> {
        Ok(Signature::now(&self.name, &self.email)?)
    }
}
