//! Sync engine for publishing notes to the remote.
//!
//! This module contains the core logic for the `pagesync sync` command:
//! clone or pull the working tree, stage published notes into it, commit
//! everything and push.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use pagesync_git::{GitOps, Oid, PullOutcome};

use crate::error::{Error, Result};
use crate::staging::{Layout, StagingPipeline, StagingReport};
use crate::traits::SourceStore;
use crate::vfs::Vfs;

/// Working trees with a sync in flight.
static IN_FLIGHT: Mutex<BTreeSet<PathBuf>> = Mutex::new(BTreeSet::new());

/// Phase of a sync, reported as it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Cloning,
    Pulling,
    Staging,
    Committing,
    Pushing,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let notice = match self {
            Self::Cloning => "Cloning repository...",
            Self::Pulling => "Pulling latest changes...",
            Self::Staging => "Staging published notes...",
            Self::Committing => "Committing...",
            Self::Pushing => "Pushing...",
        };
        f.write_str(notice)
    }
}

/// How the working tree was brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    /// The working tree did not exist and was cloned.
    Cloned,

    /// The working tree existed and was pulled.
    Pulled(PullOutcome),
}

/// Result of a completed sync.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// How the working tree was initialized.
    pub init: InitMode,
    /// What the staging pipeline wrote.
    pub staging: StagingReport,
    /// The pushed commit.
    pub commit: Oid,
    /// Its message.
    pub message: String,
}

/// Commit message for a sync at `now`.
#[must_use]
pub fn commit_message(now: DateTime<Utc>) -> String {
    format!(
        "Publish sync {}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Drives one clone-or-pull, stage, commit, push cycle.
pub struct SyncEngine<'a, G: ?Sized, S: ?Sized, F: ?Sized> {
    git: &'a G,
    source: &'a S,
    fs: &'a F,
    layout: &'a Layout,
}

impl<'a, G, S, F> SyncEngine<'a, G, S, F>
where
    G: GitOps + ?Sized,
    S: SourceStore + ?Sized,
    F: Vfs + ?Sized,
{
    /// The git working tree must be the host location of
    /// `layout.repo_root()` in `fs`.
    #[must_use]
    pub const fn new(git: &'a G, source: &'a S, fs: &'a F, layout: &'a Layout) -> Self {
        Self {
            git,
            source,
            fs,
            layout,
        }
    }

    /// Run the full cycle, calling `progress` as each phase starts.
    ///
    /// Any failure aborts the remaining phases; nothing is rolled back.
    ///
    /// # Errors
    /// Returns `SyncInProgress` if this working tree is already syncing,
    /// otherwise the first git, staging or filesystem error.
    pub fn run(&self, mut progress: impl FnMut(SyncPhase)) -> Result<SyncReport> {
        let _guard = InFlight::acquire(self.git.workdir())?;

        let init = if self.fs.exists(self.layout.repo_root())? {
            progress(SyncPhase::Pulling);
            InitMode::Pulled(self.git.pull()?)
        } else {
            progress(SyncPhase::Cloning);
            self.git.clone_remote()?;
            InitMode::Cloned
        };
        tracing::info!(?init, "working tree ready");

        progress(SyncPhase::Staging);
        let staging = StagingPipeline::new(self.source, self.fs, self.layout).run()?;

        progress(SyncPhase::Committing);
        self.git.stage_all()?;
        let message = commit_message(Utc::now());
        let commit = self.git.create_commit(&message)?;
        tracing::info!(%commit, %message, "committed");

        progress(SyncPhase::Pushing);
        self.git.push()?;
        tracing::info!(%commit, "pushed");

        Ok(SyncReport {
            init,
            staging,
            commit,
            message,
        })
    }
}

/// Marks a working tree as syncing until dropped.
struct InFlight {
    workdir: PathBuf,
}

impl InFlight {
    fn acquire(workdir: &Path) -> Result<Self> {
        let workdir = workdir.to_path_buf();
        let mut active = IN_FLIGHT.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(workdir.clone()) {
            return Err(Error::SyncInProgress(workdir));
        }
        Ok(Self { workdir })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        IN_FLIGHT
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.workdir);
    }
}
