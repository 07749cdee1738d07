//! Git object model and ref/tree/commit stores
//!
//! [`GitDataStore`] is the low-level capability the file reconciler works
//! against: resolve a ref, read a tree, write a tree and a commit, and advance
//! a ref. Hosting clients implement it over HTTP; [`LocalGitStore`]
//! implements it over a repository on disk.

pub mod error;
pub mod local;
pub mod object;
pub mod store;

pub use error::{Error, Result};
pub use local::LocalGitStore;
pub use object::{
    Commit, EntryKind, EntrySource, MODE_FILE, MODE_TREE, NewTreeEntry, Sha, Tree, TreeEntry,
};
pub use store::GitDataStore;
