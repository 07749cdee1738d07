//! Git repository fixtures and inspection helpers.
//!
//! Everything goes through `git2`, so the fixtures work without a `git`
//! binary on the test machine.

use std::fs;
use std::path::Path;

use git2::{Oid, Repository, Signature};

/// Branch every fixture commits to.
pub const MAIN_REF: &str = "refs/heads/main";

fn signature() -> Signature<'static> {
    Signature::now("Test User", "test@test.com")
        .unwrap_or_else(|e| panic!("signature: failed to build test signature: {e}"))
}

/// Initialises an empty git repository (no commits, no config).
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn real_git_repo(path: &Path) -> Repository {
    Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Initialises a repository whose `main` branch has one commit holding `files`.
///
/// Each `(path, content)` pair is written to the working tree (parent
/// directories are created for nested paths) and committed as
/// "Initial commit". `HEAD` points at `main` afterwards.
///
/// # Panics
/// Panics if any filesystem or git operation fails.
pub fn repo_with_files(path: &Path, files: &[(&str, &str)]) -> Repository {
    let repo = real_git_repo(path);
    {
        let mut config = repo
            .config()
            .unwrap_or_else(|e| panic!("repo_with_files: failed to open config: {e}"));
        config
            .set_str("user.name", "Test User")
            .unwrap_or_else(|e| panic!("repo_with_files: failed to set user.name: {e}"));
        config
            .set_str("user.email", "test@test.com")
            .unwrap_or_else(|e| panic!("repo_with_files: failed to set user.email: {e}"));
    }

    let mut index = repo
        .index()
        .unwrap_or_else(|e| panic!("repo_with_files: failed to open index: {e}"));
    for (file, content) in files {
        let full = path.join(file);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("repo_with_files: failed to create {file}: {e}"));
        }
        fs::write(&full, content)
            .unwrap_or_else(|e| panic!("repo_with_files: failed to write {file}: {e}"));
        index
            .add_path(Path::new(file))
            .unwrap_or_else(|e| panic!("repo_with_files: failed to stage {file}: {e}"));
    }
    let tree_id = index
        .write_tree()
        .unwrap_or_else(|e| panic!("repo_with_files: failed to write tree: {e}"));

    {
        let tree = repo
            .find_tree(tree_id)
            .unwrap_or_else(|e| panic!("repo_with_files: failed to find tree: {e}"));
        let sig = signature();
        repo.commit(Some(MAIN_REF), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap_or_else(|e| panic!("repo_with_files: failed to commit: {e}"));
    }
    repo.set_head(MAIN_REF)
        .unwrap_or_else(|e| panic!("repo_with_files: failed to set HEAD: {e}"));
    repo
}

/// Commit id `refname` points at.
///
/// # Panics
/// Panics if the reference does not exist.
pub fn ref_target(repo: &Repository, refname: &str) -> Oid {
    repo.refname_to_id(refname)
        .unwrap_or_else(|e| panic!("ref_target: cannot resolve {refname}: {e}"))
}

/// Number of commits reachable from `refname`.
///
/// # Panics
/// Panics if the reference cannot be walked.
pub fn commit_count(repo: &Repository, refname: &str) -> usize {
    let mut walk = repo
        .revwalk()
        .unwrap_or_else(|e| panic!("commit_count: failed to start revwalk: {e}"));
    walk.push_ref(refname)
        .unwrap_or_else(|e| panic!("commit_count: cannot walk {refname}: {e}"));
    walk.count()
}

/// Contents of `path` in the tree `refname` points at, or `None` if absent.
///
/// # Panics
/// Panics if the reference cannot be resolved or the entry is not a blob.
pub fn file_at(repo: &Repository, refname: &str, path: &str) -> Option<String> {
    let tree = repo
        .find_reference(refname)
        .and_then(|r| r.peel_to_tree())
        .unwrap_or_else(|e| panic!("file_at: cannot resolve {refname}: {e}"));

    let entry = tree.get_path(Path::new(path)).ok()?;
    let blob = repo
        .find_blob(entry.id())
        .unwrap_or_else(|e| panic!("file_at: {path} is not a blob: {e}"));
    Some(String::from_utf8_lossy(blob.content()).into_owned())
}

/// Parent ids of the commit `refname` points at.
pub fn parents_of(repo: &Repository, refname: &str) -> Vec<Oid> {
    let commit = repo
        .find_reference(refname)
        .and_then(|r| r.peel_to_commit())
        .unwrap_or_else(|e| panic!("parents_of: cannot resolve {refname}: {e}"));
    commit.parent_ids().collect()
}
