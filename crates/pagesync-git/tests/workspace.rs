//! End-to-end tests of the publishing cycle against a local bare remote.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use git2::Signature;
use pagesync_git::{Author, Error, GitOps, PullOutcome, RemoteSpec, Workspace};
use tempfile::TempDir;

/// Create a bare remote with one commit on `main`.
fn seeded_remote(root: &Path) -> String {
    let path = root.join("remote.git");
    let bare = git2::Repository::init_bare(&path).expect("init bare remote");
    {
        let sig = Signature::now("Seed", "seed@example.com").unwrap();
        let blob = bare.blob(b"# site\n").unwrap();
        let mut builder = bare.treebuilder(None).unwrap();
        builder.insert("README.md", blob, 0o100_644).unwrap();
        let tree = bare.find_tree(builder.write().unwrap()).unwrap();
        bare.commit(Some("refs/heads/main"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();
    }
    bare.set_head("refs/heads/main").unwrap();
    path.to_str().unwrap().to_owned()
}

/// Local transport does not support shallow fetches, so tests clone in full.
fn workspace(workdir: &Path, url: &str) -> Workspace {
    Workspace::new(
        workdir,
        RemoteSpec::new(url, "main").with_depth(0),
        Author::new("Publisher", "publisher@example.com"),
    )
}

fn remote_tip(url: &str) -> git2::Oid {
    let bare = git2::Repository::open_bare(url).unwrap();
    bare.refname_to_id("refs/heads/main").unwrap()
}

#[test]
fn clone_commit_push_round_trip() {
    let temp = TempDir::new().unwrap();
    let url = seeded_remote(temp.path());
    let workdir = temp.path().join("repo");
    let ws = workspace(&workdir, &url);

    ws.clone_remote().unwrap();
    assert!(workdir.join("README.md").exists());

    fs::create_dir_all(workdir.join("src/notes/guides")).unwrap();
    fs::write(workdir.join("src/notes/guides/foo.md"), "---\nPublished: true\n---\nHi\n").unwrap();
    ws.stage_all().unwrap();
    let commit = ws.create_commit("Publish sync test").unwrap();
    ws.push().unwrap();

    assert_eq!(remote_tip(&url), commit);
    let repo = git2::Repository::open(&workdir).unwrap();
    assert_eq!(repo.head().unwrap().shorthand(), Some("main"));
}

#[test]
fn pull_fast_forwards_to_remote_changes() {
    let temp = TempDir::new().unwrap();
    let url = seeded_remote(temp.path());

    let first = workspace(&temp.path().join("first"), &url);
    first.clone_remote().unwrap();
    let second = workspace(&temp.path().join("second"), &url);
    second.clone_remote().unwrap();

    fs::write(temp.path().join("second/new.md"), "new\n").unwrap();
    second.stage_all().unwrap();
    let pushed = second.create_commit("from second").unwrap();
    second.push().unwrap();

    let outcome = first.pull().unwrap();

    assert_eq!(outcome, PullOutcome::FastForwarded(pushed));
    assert!(temp.path().join("first/new.md").exists());
    assert_eq!(first.pull().unwrap(), PullOutcome::UpToDate);
}

#[test]
fn diverged_history_is_not_merged() {
    let temp = TempDir::new().unwrap();
    let url = seeded_remote(temp.path());

    let first = workspace(&temp.path().join("first"), &url);
    first.clone_remote().unwrap();
    let second = workspace(&temp.path().join("second"), &url);
    second.clone_remote().unwrap();

    fs::write(temp.path().join("second/remote.md"), "remote\n").unwrap();
    second.stage_all().unwrap();
    second.create_commit("remote side").unwrap();
    second.push().unwrap();

    fs::write(temp.path().join("first/local.md"), "local\n").unwrap();
    first.stage_all().unwrap();
    first.create_commit("local side").unwrap();

    assert!(matches!(first.pull(), Err(Error::NotFastForward(b)) if b == "main"));
}

#[test]
fn clone_of_missing_remote_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing.git");
    let ws = workspace(&temp.path().join("repo"), missing.to_str().unwrap());

    assert!(matches!(ws.clone_remote(), Err(Error::CloneFailed(_))));
}

#[test]
fn credentials_never_land_in_repository_config() {
    let temp = TempDir::new().unwrap();
    let url = seeded_remote(temp.path());
    let workdir = temp.path().join("repo");
    let ws = workspace(&workdir, &url).with_credentials(std::sync::Arc::new(|| {
        pagesync_http::Credentials::token("ghp_never_persisted")
    }));

    ws.clone_remote().unwrap();

    let config = fs::read_to_string(workdir.join(".git/config")).unwrap();
    assert!(!config.contains("ghp_never_persisted"));
    assert!(config.contains(&url));
}
