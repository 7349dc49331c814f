//! Publishing a vault end to end into a local bare remote.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use git2::Signature;
use pagesync_core::{DiskFs, InitMode, Layout, SyncEngine, SyncPhase, Vault, Vfs};
use pagesync_git::{Author, PullOutcome, RemoteSpec, Workspace};
use tempfile::TempDir;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];

fn seeded_remote(root: &Path) -> String {
    let path = root.join("site.git");
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

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Read `path` from the tip of `main` in the bare remote.
fn remote_file(url: &str, path: &str) -> Option<Vec<u8>> {
    let bare = git2::Repository::open_bare(url).unwrap();
    let tree = bare
        .find_reference("refs/heads/main")
        .unwrap()
        .peel_to_tree()
        .unwrap();
    let entry = tree.get_path(Path::new(path)).ok()?;
    let blob = bare.find_blob(entry.id()).unwrap();
    Some(blob.content().to_vec())
}

struct Fixture {
    _temp: TempDir,
    url: String,
    vault_dir: std::path::PathBuf,
    store: DiskFs,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let url = seeded_remote(temp.path());
        let vault_dir = temp.path().join("vault");
        fs::create_dir_all(&vault_dir).unwrap();
        let store = DiskFs::open(temp.path().join("cache")).unwrap();
        Self {
            _temp: temp,
            url,
            vault_dir,
            store,
        }
    }

    fn sync(&self) -> (pagesync_core::SyncReport, Vec<SyncPhase>) {
        let layout = Layout::default();
        let workspace = Workspace::new(
            self.store.host_path(layout.repo_root()),
            RemoteSpec::new(&self.url, "main").with_depth(0),
            Author::new("me", "mobile@pagesync.local"),
        );
        let vault = Vault::open(&self.vault_dir).unwrap();
        let mut phases = Vec::new();
        let report = SyncEngine::new(&workspace, &vault, &self.store, &layout)
            .run(|phase| phases.push(phase))
            .unwrap();
        (report, phases)
    }
}

#[test]
fn first_sync_clones_and_publishes() {
    let fx = Fixture::new();
    write(
        &fx.vault_dir,
        "foo.md",
        b"---\nPublished: true\nSpecTag: guides\n---\n# Hi\nHello world",
    );
    write(&fx.vault_dir, "draft.md", b"---\nPublished: false\n---\nsecret");

    let (report, phases) = fx.sync();

    assert_eq!(report.init, InitMode::Cloned);
    assert_eq!(phases[0], SyncPhase::Cloning);
    assert!(report.message.starts_with("Publish sync "));
    assert_eq!(
        remote_file(&fx.url, "src/notes/guides/foo.md").unwrap(),
        b"---\nPublished: true\nSpecTag: guides\ndesc: Hi Hello world\n---\n# Hi\nHello world\n"
    );
    assert!(remote_file(&fx.url, "src/notes/Uncategorized/draft.md").is_none());
    assert!(remote_file(&fx.url, "README.md").is_some());
}

#[test]
fn second_sync_pulls_and_is_stable() {
    let fx = Fixture::new();
    write(&fx.vault_dir, "a.md", b"---\nPublished: \"True\"\ndesc: Custom\n---\nbody\n");

    let (first, _) = fx.sync();
    let staged = fx
        .store
        .read_file(Path::new("/repo/src/notes/Uncategorized/a.md"))
        .unwrap();

    let (second, phases) = fx.sync();

    assert_eq!(second.init, InitMode::Pulled(PullOutcome::UpToDate));
    assert_eq!(phases[0], SyncPhase::Pulling);
    assert_ne!(first.commit, second.commit);
    assert_eq!(
        fx.store
            .read_file(Path::new("/repo/src/notes/Uncategorized/a.md"))
            .unwrap(),
        staged
    );
}

#[test]
fn images_are_published_and_other_embeds_are_not() {
    let fx = Fixture::new();
    write(
        &fx.vault_dir,
        "notes/c.md",
        b"---\nPublished: true\n---\n![[pic.png]]\n![[diagram.svg]]\n![[missing.png]]\n",
    );
    write(&fx.vault_dir, "attachments/pic.png", PNG);
    write(&fx.vault_dir, "attachments/diagram.svg", b"<svg/>");

    let (report, _) = fx.sync();

    assert_eq!(report.staging.assets_copied(), 1);
    assert_eq!(remote_file(&fx.url, "public/images/pic.png").unwrap(), PNG);
    assert!(remote_file(&fx.url, "public/images/diagram.svg").is_none());
    assert!(remote_file(&fx.url, "src/notes/Uncategorized/c.md").is_some());
}

#[test]
fn unpublished_files_already_in_the_tree_are_kept() {
    let fx = Fixture::new();
    write(&fx.vault_dir, "a.md", b"---\nPublished: true\n---\nfirst\n");
    fx.sync();

    write(&fx.vault_dir, "a.md", b"---\nPublished: false\n---\nfirst\n");
    fx.sync();

    assert!(remote_file(&fx.url, "src/notes/Uncategorized/a.md").is_some());
}
