//! Error types for pagesync-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No repository at the working tree path.
    #[error("not a git repository: {0}")]
    NotARepository(String),

    /// Remote not found.
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// The remote rejected the credentials.
    #[error("authentication failed - check the git token: {0}")]
    AuthenticationFailed(String),

    /// Clone failed.
    #[error("clone failed: {0}")]
    CloneFailed(String),

    /// Fetch failed.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Local and remote histories diverged; pull only fast-forwards.
    #[error("cannot fast-forward '{0}' - local and remote history diverged")]
    NotFastForward(String),

    /// Push failed.
    #[error("push failed: {0}")]
    PushFailed(String),

    /// Another sync already owns the HTTP transport.
    #[error("a sync is already in progress")]
    SyncInProgress,

    /// Registering the HTTP transport with libgit2 failed.
    #[error("failed to register HTTP transport: {0}")]
    TransportRegistration(String),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}

impl Error {
    /// Classify a git2 error raised by a network operation.
    ///
    /// Authentication failures are recognized both from libgit2's own error
    /// code and from the message raised by the buffered transport; everything
    /// else is wrapped by `other`.
    pub(crate) fn from_network(err: &git2::Error, other: fn(String) -> Self) -> Self {
        let message = err.message().to_owned();
        if err.code() == git2::ErrorCode::Auth
            || message.contains(crate::transport::AUTH_FAILED_MESSAGE)
        {
            Self::AuthenticationFailed(message)
        } else {
            other(message)
        }
    }
}
