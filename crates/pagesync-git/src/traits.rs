//! Trait abstractions for git operations.
//!
//! This module defines the `GitOps` trait which abstracts the remote
//! publishing cycle, enabling dependency injection and testability.

use std::path::Path;

use git2::Oid;

use crate::{PullOutcome, Result};

/// Trait for the clone/pull/add/commit/push cycle of one working tree.
///
/// This trait abstracts git operations, allowing for:
/// - Dependency injection in the sync orchestrator
/// - Mock implementations for testing
///
/// Note: git operations are synchronous since git2 is a synchronous library.
#[allow(clippy::missing_errors_doc)]
pub trait GitOps {
    /// Get the working tree path.
    fn workdir(&self) -> &Path;

    /// Clone the remote into the (absent) working tree.
    fn clone_remote(&self) -> Result<()>;

    /// Fetch and fast-forward the existing working tree.
    fn pull(&self) -> Result<PullOutcome>;

    /// Stage all changes.
    fn stage_all(&self) -> Result<()>;

    /// Create a commit with the staged changes.
    fn create_commit(&self, message: &str) -> Result<Oid>;

    /// Push the branch to the remote.
    fn push(&self) -> Result<()>;
}
