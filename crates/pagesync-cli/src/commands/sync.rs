//! `pagesync sync` command - publish the vault to the site repository.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pagesync_core::{Config, DiskFs, InitMode, Layout, SyncEngine, Vault};
use pagesync_git::{Author, PullOutcome, RemoteSpec, Workspace};
use pagesync_http::{CredentialCallback, Credentials, HttpClient};

use crate::output;

/// Run the sync command.
pub fn run(vault: Option<&Path>) -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    config.validate()?;

    let vault_dir = vault.map_or_else(|| config.paths.vault.clone(), Path::to_path_buf);
    let vault = Vault::open(&vault_dir)
        .with_context(|| format!("Failed to read vault {}", vault_dir.display()))?;

    let cache_dir = config.paths.cache_dir();
    let store = DiskFs::open(&cache_dir)
        .with_context(|| format!("Failed to open cache {}", cache_dir.display()))?;
    let layout = Layout::new(&config.paths.notes_dir, &config.paths.assets_dir);
    tracing::debug!(
        vault = %vault_dir.display(),
        cache = %cache_dir.display(),
        branch = %config.remote.branch,
        "starting sync"
    );

    // Handed to libgit2 per request; never written to the repository.
    let token = config.remote.git_token.clone();
    let credentials: CredentialCallback = Arc::new(move || Credentials::token(&token));
    let http = HttpClient::new().context("Failed to create HTTP client")?;

    let remote = RemoteSpec::new(&config.remote.git_url, &config.remote.branch)
        .with_depth(config.remote.depth);
    let author = Author::new(&config.remote.username, &config.remote.author_email);
    let workspace = Workspace::new(store.host_path(layout.repo_root()), remote, author)
        .with_credentials(credentials)
        .with_transport(Arc::new(http))?;

    let report = SyncEngine::new(&workspace, &vault, &store, &layout)
        .run(|phase| output::info(&phase.to_string()))?;

    if let InitMode::Pulled(PullOutcome::FastForwarded(oid)) = report.init {
        output::detail(&format!("  fast-forwarded to {}", short(&oid.to_string())));
    }
    if report.staging.staged.is_empty() {
        output::warn("No published notes found - set `Published: true` in a note's frontmatter");
    }
    for doc in &report.staging.staged {
        output::detail(&format!("  {}", doc.destination.display()));
    }

    output::success(&format!(
        "Published {} and {} ({})",
        output::count(report.staging.staged.len(), "note", "notes"),
        output::count(report.staging.assets_copied(), "image", "images"),
        short(&report.commit.to_string()),
    ));
    Ok(())
}

fn short(oid: &str) -> String {
    oid.chars().take(7).collect()
}
