//! Git object model
//!
//! The serde shapes match the git data API of common hosting services, so
//! HTTP clients can (de)serialize these types directly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mode of a regular, non-executable file.
pub const MODE_FILE: &str = "100644";
/// Mode of a subdirectory.
pub const MODE_TREE: &str = "040000";

/// A content-addressed object id in lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha(String);

impl Sha {
    /// Parse a SHA-1 or SHA-256 hex id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSha` if `value` is not 40 or 64 hex digits.
    pub fn parse(value: &str) -> Result<Self> {
        let valid_len = value.len() == 40 || value.len() == 64;
        if !valid_len || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidSha {
                value: value.to_string(),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Sha {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Sha> for String {
    fn from(sha: Sha) -> Self {
        sha.0
    }
}

impl From<git2::Oid> for Sha {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

/// Kind of object a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
}

/// One entry of a (possibly recursive) tree listing.
///
/// In a recursive listing `path` is the full slash-separated path from the
/// root of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: Sha,
}

impl TreeEntry {
    pub fn is_tree(&self) -> bool {
        self.kind == EntryKind::Tree
    }
}

/// A tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub sha: Sha,
    #[serde(rename = "tree")]
    pub entries: Vec<TreeEntry>,
    /// Set by services that cap the size of a recursive listing
    #[serde(default)]
    pub truncated: bool,
}

impl Tree {
    /// Entry at exactly `path`.
    pub fn find(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Entries that are not subtrees.
    pub fn leaves(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(|e| !e.is_tree())
    }
}

/// Where the object for a [`NewTreeEntry`] comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// An object that already exists in the store
    Sha(Sha),
    /// Inline file content, stored as a new blob
    Content(String),
}

/// An entry of a tree to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(flatten)]
    pub source: EntrySource,
}

impl NewTreeEntry {
    /// A regular file with inline content.
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: MODE_FILE.to_string(),
            kind: EntryKind::Blob,
            source: EntrySource::Content(content.into()),
        }
    }
}

impl From<&TreeEntry> for NewTreeEntry {
    /// Carry an existing entry over unchanged.
    fn from(entry: &TreeEntry) -> Self {
        Self {
            path: entry.path.clone(),
            mode: entry.mode.clone(),
            kind: entry.kind,
            source: EntrySource::Sha(entry.sha.clone()),
        }
    }
}

/// A commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: Sha,
    pub tree: Sha,
    pub parents: Vec<Sha>,
    pub message: String,
}
