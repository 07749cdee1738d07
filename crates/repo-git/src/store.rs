//! Ref/tree/commit capability trait

use async_trait::async_trait;

use crate::Result;
use crate::object::{Commit, NewTreeEntry, Sha, Tree};

/// Low-level access to a repository's refs, trees and commits.
///
/// Implementations must refuse a ref update that does not advance the ref to
/// a descendant of its current commit.
#[async_trait]
pub trait GitDataStore: Send + Sync {
    /// Commit id a fully-qualified ref (e.g. `refs/heads/main`) points at.
    async fn get_ref(&self, name: &str) -> Result<Sha>;

    async fn get_commit(&self, sha: &Sha) -> Result<Commit>;

    /// List a tree. With `recursive`, subtrees are expanded and entry paths
    /// are full paths from the root.
    async fn get_tree(&self, sha: &Sha, recursive: bool) -> Result<Tree>;

    /// Write a tree from a flat list of entries. Nested paths create the
    /// intermediate subtrees. Returns the id of the new tree.
    async fn create_tree(&self, entries: &[NewTreeEntry]) -> Result<Sha>;

    /// Write a commit of `tree` with the given parents.
    async fn create_commit(&self, message: &str, tree: &Sha, parents: &[Sha]) -> Result<Sha>;

    /// Move an existing ref to `sha`. Not forced.
    async fn update_ref(&self, name: &str, sha: &Sha) -> Result<()>;
}
