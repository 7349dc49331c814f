//! # pagesync-git
//!
//! Git operations for pagesync, built on git2-rs: shallow single-branch
//! clone, fast-forward pull, stage-all, commit and push, plus a smart-HTTP
//! transport that runs the git wire protocol over a buffered HTTP primitive.

mod error;
mod remote;
mod repository;
mod traits;
pub mod transport;
mod workspace;

pub use error::{Error, Result};
pub use git2::Oid;
pub use remote::{Author, RemoteSpec};
pub use repository::{PullOutcome, REMOTE_NAME, Repository};
pub use traits::GitOps;
pub use transport::SessionGuard;
pub use workspace::Workspace;
