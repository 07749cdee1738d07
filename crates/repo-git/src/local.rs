//! `git2`-backed [`GitDataStore`] over a repository on disk

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use git2::{ErrorCode, ObjectType, Oid, Repository, Signature, TreeWalkMode, TreeWalkResult};

use crate::object::{
    Commit, EntryKind, EntrySource, MODE_TREE, NewTreeEntry, Sha, Tree, TreeEntry,
};
use crate::store::GitDataStore;
use crate::{Error, Result};

/// A [`GitDataStore`] reading and writing a local repository.
///
/// The repository is reopened for every operation, so the store is `Sync`
/// and other handles on the same path see its writes immediately.
#[derive(Debug, Clone)]
pub struct LocalGitStore {
    path: PathBuf,
}

impl LocalGitStore {
    /// Open the repository at `path` (bare or with a working tree).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        Repository::open(&path)?;
        Ok(Self { path })
    }

    fn repo(&self) -> Result<Repository> {
        Ok(Repository::open(&self.path)?)
    }
}

fn oid(sha: &Sha) -> Result<Oid> {
    Ok(Oid::from_str(sha.as_str())?)
}

fn ref_not_found(name: &str) -> impl FnOnce(git2::Error) -> Error + '_ {
    move |e| {
        if e.code() == ErrorCode::NotFound {
            Error::RefNotFound {
                name: name.to_string(),
            }
        } else {
            Error::Git(e)
        }
    }
}

fn parse_mode(path: &str, mode: &str) -> Result<i32> {
    i32::from_str_radix(mode, 8).map_err(|_| Error::InvalidMode {
        path: path.to_string(),
        mode: mode.to_string(),
    })
}

fn entry_name<'a>(root: &str, entry: &'a git2::TreeEntry<'_>) -> Result<&'a str> {
    entry.name().ok_or_else(|| Error::NonUtf8Path {
        path: format!("{root}{}", String::from_utf8_lossy(entry.name_bytes())),
    })
}

fn entry_kind(kind: Option<ObjectType>) -> EntryKind {
    match kind {
        Some(ObjectType::Tree) => EntryKind::Tree,
        Some(ObjectType::Commit) => EntryKind::Commit,
        _ => EntryKind::Blob,
    }
}

fn to_entry(path: String, entry: &git2::TreeEntry<'_>) -> TreeEntry {
    TreeEntry {
        path,
        mode: format!("{:06o}", entry.filemode()),
        kind: entry_kind(entry.kind()),
        sha: entry.id().into(),
    }
}

/// Directory structure assembled from a flat entry list before writing.
enum Node {
    Leaf { oid: Oid, mode: i32 },
    Dir(BTreeMap<String, Node>),
}

fn insert_node(root: &mut BTreeMap<String, Node>, path: &str, leaf: Node) -> Result<()> {
    let conflict = || Error::PathConflict {
        path: path.to_string(),
    };

    let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let Some(name) = parts.pop() else {
        return Err(conflict());
    };

    let mut dir = root;
    for part in parts {
        let node = dir
            .entry(part.to_string())
            .or_insert_with(|| Node::Dir(BTreeMap::new()));
        dir = match node {
            Node::Dir(children) => children,
            Node::Leaf { .. } => return Err(conflict()),
        };
    }

    if dir.contains_key(name) {
        return Err(conflict());
    }
    dir.insert(name.to_string(), leaf);
    Ok(())
}

fn write_dir(repo: &Repository, dir: &BTreeMap<String, Node>) -> Result<Oid> {
    let mut builder = repo.treebuilder(None)?;
    for (name, node) in dir {
        match node {
            Node::Leaf { oid, mode } => {
                builder.insert(name, *oid, *mode)?;
            }
            Node::Dir(children) => {
                let child = write_dir(repo, children)?;
                builder.insert(name, child, parse_mode(name, MODE_TREE)?)?;
            }
        }
    }
    Ok(builder.write()?)
}

#[async_trait]
impl GitDataStore for LocalGitStore {
    async fn get_ref(&self, name: &str) -> Result<Sha> {
        let repo = self.repo()?;
        let reference = repo.find_reference(name).map_err(ref_not_found(name))?;
        Ok(reference.peel_to_commit()?.id().into())
    }

    async fn get_commit(&self, sha: &Sha) -> Result<Commit> {
        let repo = self.repo()?;
        let commit = repo.find_commit(oid(sha)?)?;
        Ok(Commit {
            sha: commit.id().into(),
            tree: commit.tree_id().into(),
            parents: commit.parent_ids().map(Sha::from).collect(),
            message: commit.message().unwrap_or_default().to_string(),
        })
    }

    async fn get_tree(&self, sha: &Sha, recursive: bool) -> Result<Tree> {
        let repo = self.repo()?;
        let tree = repo.find_tree(oid(sha)?)?;

        let mut entries = Vec::with_capacity(tree.len());
        if recursive {
            let mut failed = None;
            let walked = tree.walk(TreeWalkMode::PreOrder, |root, entry| {
                match entry_name(root, entry) {
                    Ok(name) => {
                        entries.push(to_entry(format!("{root}{name}"), entry));
                        TreeWalkResult::Ok
                    }
                    Err(e) => {
                        failed = Some(e);
                        TreeWalkResult::Abort
                    }
                }
            });
            if let Some(e) = failed {
                return Err(e);
            }
            walked?;
        } else {
            for entry in tree.iter() {
                let name = entry_name("", &entry)?.to_string();
                entries.push(to_entry(name, &entry));
            }
        }

        Ok(Tree {
            sha: tree.id().into(),
            entries,
            truncated: false,
        })
    }

    async fn create_tree(&self, entries: &[NewTreeEntry]) -> Result<Sha> {
        let repo = self.repo()?;

        let mut root = BTreeMap::new();
        for entry in entries {
            let mode = parse_mode(&entry.path, &entry.mode)?;
            let oid = match &entry.source {
                EntrySource::Sha(sha) => oid(sha)?,
                EntrySource::Content(content) => repo.blob(content.as_bytes())?,
            };
            insert_node(&mut root, &entry.path, Node::Leaf { oid, mode })?;
        }

        let tree = write_dir(&repo, &root)?;
        tracing::debug!(tree = %tree, entries = entries.len(), "Wrote tree");
        Ok(tree.into())
    }

    async fn create_commit(&self, message: &str, tree: &Sha, parents: &[Sha]) -> Result<Sha> {
        let repo = self.repo()?;
        let tree = repo.find_tree(oid(tree)?)?;
        let parents = parents
            .iter()
            .map(|p| Ok(repo.find_commit(oid(p)?)?))
            .collect::<Result<Vec<_>>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let sig = match repo.signature() {
            Ok(sig) => sig,
            Err(_) => Signature::now("repo-policy", "repo-policy@localhost")?,
        };
        let commit = repo.commit(None, &sig, &sig, message, &tree, &parent_refs)?;
        Ok(commit.into())
    }

    async fn update_ref(&self, name: &str, sha: &Sha) -> Result<()> {
        let repo = self.repo()?;
        let new = oid(sha)?;

        let current = repo
            .find_reference(name)
            .map_err(ref_not_found(name))?
            .resolve()?
            .target()
            .ok_or_else(|| Error::RefNotFound {
                name: name.to_string(),
            })?;

        if current == new {
            return Ok(());
        }
        if !repo.graph_descendant_of(new, current)? {
            return Err(Error::NotFastForward {
                name: name.to_string(),
                from: current.to_string(),
                to: new.to_string(),
            });
        }

        repo.reference_matching(name, new, true, current, "repo-policy: advance ref")?;
        tracing::debug!(reference = %name, from = %current, to = %new, "Advanced ref");
        Ok(())
    }
}
