//! File reconciliation against a git tree
//!
//! The desired tree is rebuilt from the current tree's flat, recursive
//! listing and written through the store. Because trees are
//! content-addressed, an unchanged file yields the same tree id as the
//! current one, and no commit is made.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use repo_git::{EntryKind, GitDataStore, NewTreeEntry, Sha, Tree};
use repo_policy::{DesiredState, GoalConfig, GoalOutcome};
use serde::Deserialize;

use crate::{Error, Result};

/// Ref updated when the payload does not name one.
pub const DEFAULT_REF: &str = "refs/heads/main";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileParams {
    state: DesiredState,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    filename: Option<PathBuf>,
    #[serde(alias = "name")]
    path: String,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
}

/// Desired state of one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Present { content: String },
    Absent,
}

/// A parsed `file` goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGoal {
    pub path: String,
    pub reference: String,
    pub state: FileState,
}

fn invalid(message: impl Into<String>) -> repo_policy::Error {
    repo_policy::Error::InvalidConfig {
        kind: "file",
        message: message.into(),
    }
}

impl FileGoal {
    /// Parse a `file` payload.
    ///
    /// Content comes from `content` or is read from the local file named by
    /// `filename`; naming both is ambiguous. `name` is accepted for `path`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unknown `state`, a missing or empty
    /// path, ambiguous or missing content, or an unreadable `filename`.
    pub fn parse(config: &GoalConfig) -> repo_policy::Result<Self> {
        let params: FileParams = config.parse("file")?;

        let path = params.path.trim_matches('/').to_string();
        if path.is_empty() {
            return Err(invalid("path must not be empty"));
        }

        let content = match (params.content, params.filename) {
            (Some(_), Some(_)) => {
                return Err(invalid("cannot specify both content and filename"));
            }
            (Some(content), None) => Some(content),
            (None, Some(filename)) => {
                let content = std::fs::read_to_string(&filename).map_err(|e| {
                    invalid(format!("cannot read {}: {e}", filename.display()))
                })?;
                Some(content)
            }
            (None, None) => None,
        };

        let state = match (params.state, content) {
            (DesiredState::Present, Some(content)) => FileState::Present { content },
            (DesiredState::Present, None) => {
                return Err(invalid("present requires content or filename"));
            }
            (DesiredState::Absent, _) => FileState::Absent,
        };

        Ok(Self {
            path,
            reference: params.reference.unwrap_or_else(|| DEFAULT_REF.to_string()),
            state,
        })
    }
}

/// Reconciles `file` goals, caching fetched trees by commit id.
pub struct FileReconciler<S> {
    store: Arc<S>,
    trees: HashMap<Sha, Tree>,
}

impl<S: GitDataStore> FileReconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            trees: HashMap::new(),
        }
    }

    /// Recursive tree of `commit`, fetched once per commit.
    async fn tree_of(&mut self, commit: &Sha) -> Result<&Tree> {
        if !self.trees.contains_key(commit) {
            let tree_sha = self.store.get_commit(commit).await?.tree;
            let tree = self.store.get_tree(&tree_sha, true).await?;
            if tree.truncated {
                return Err(repo_git::Error::TruncatedTree {
                    sha: tree_sha.to_string(),
                }
                .into());
            }
            tracing::debug!(commit = %commit.short(), entries = tree.entries.len(), "Fetched tree");
            self.trees.insert(commit.clone(), tree);
        }
        self.trees
            .get(commit)
            .ok_or_else(|| Error::NotFound(format!("tree for commit {commit}")))
    }

    /// Make `goal.path` on `goal.reference` match the goal.
    pub async fn apply(&mut self, goal: &FileGoal) -> Result<GoalOutcome> {
        let tip = self.store.get_ref(&goal.reference).await?;
        let tree = self.tree_of(&tip).await?;
        let path = goal.path.as_str();

        let (entries, message) = match &goal.state {
            FileState::Present { content } => {
                let existing = tree.find(path);
                let mut entries: Vec<NewTreeEntry> = tree
                    .leaves()
                    .filter(|e| e.path != path)
                    .map(NewTreeEntry::from)
                    .collect();

                let mut entry = NewTreeEntry::file(path, content.as_str());
                if let Some(old) = existing.filter(|e| e.kind == EntryKind::Blob) {
                    entry.mode = old.mode.clone();
                }
                entries.push(entry);

                let verb = if existing.is_some() { "Update" } else { "Add" };
                (entries, format!("{verb} '{path}'"))
            }
            FileState::Absent => {
                if tree.find(path).is_none() {
                    tracing::debug!(path = %path, "File already absent");
                    return Ok(GoalOutcome::Unchanged);
                }
                let nested = format!("{path}/");
                let entries = tree
                    .leaves()
                    .filter(|e| e.path != path && !e.path.starts_with(&nested))
                    .map(NewTreeEntry::from)
                    .collect();
                (entries, format!("Remove '{path}'"))
            }
        };

        let current_tree = tree.sha.clone();
        let new_tree = self.store.create_tree(&entries).await?;
        if new_tree == current_tree {
            tracing::debug!(path = %path, "File already up to date");
            return Ok(GoalOutcome::Unchanged);
        }

        let commit = self
            .store
            .create_commit(&message, &new_tree, std::slice::from_ref(&tip))
            .await?;
        self.store.update_ref(&goal.reference, &commit).await?;
        tracing::info!(
            path = %path,
            reference = %goal.reference,
            commit = %commit.short(),
            "Committed file change"
        );

        Ok(GoalOutcome::changed(format!("{message} ({})", commit.short())))
    }
}
