//! Test doubles for repo-hosting

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use repo_git::{Commit, GitDataStore, LocalGitStore, NewTreeEntry, Sha, Tree};
use repo_hosting::{Error, Hook, HookApi, HookSpec, Result};
use serde_json::{Map, json};

/// Counts of mutating store calls.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreCalls {
    pub get_tree: usize,
    pub create_tree: usize,
    pub create_commit: usize,
    pub update_ref: usize,
}

/// A [`LocalGitStore`] that counts the calls made through it.
pub struct CountingStore {
    inner: LocalGitStore,
    calls: Mutex<StoreCalls>,
}

impl CountingStore {
    pub fn new(inner: LocalGitStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(StoreCalls::default()),
        }
    }

    pub fn calls(&self) -> StoreCalls {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitDataStore for CountingStore {
    async fn get_ref(&self, name: &str) -> repo_git::Result<Sha> {
        self.inner.get_ref(name).await
    }

    async fn get_commit(&self, sha: &Sha) -> repo_git::Result<Commit> {
        self.inner.get_commit(sha).await
    }

    async fn get_tree(&self, sha: &Sha, recursive: bool) -> repo_git::Result<Tree> {
        self.calls.lock().unwrap().get_tree += 1;
        self.inner.get_tree(sha, recursive).await
    }

    async fn create_tree(&self, entries: &[NewTreeEntry]) -> repo_git::Result<Sha> {
        self.calls.lock().unwrap().create_tree += 1;
        self.inner.create_tree(entries).await
    }

    async fn create_commit(&self, message: &str, tree: &Sha, parents: &[Sha]) -> repo_git::Result<Sha> {
        self.calls.lock().unwrap().create_commit += 1;
        self.inner.create_commit(message, tree, parents).await
    }

    async fn update_ref(&self, name: &str, sha: &Sha) -> repo_git::Result<()> {
        self.calls.lock().unwrap().update_ref += 1;
        self.inner.update_ref(name, sha).await
    }
}

/// One recorded hook API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    List,
    Create(String),
    Update(u64),
    Delete(u64),
}

/// In-memory hook API.
#[derive(Default)]
pub struct FakeHooks {
    hooks: Mutex<Vec<Hook>>,
    calls: Mutex<Vec<HookCall>>,
    last_id: Mutex<u64>,
    fail_deletes: bool,
}

pub fn hook(id: u64, url: &str) -> Hook {
    let mut config = Map::new();
    config.insert("url".into(), json!(url));
    Hook {
        id,
        name: "web".into(),
        active: true,
        events: vec!["push".into()],
        config,
    }
}

impl FakeHooks {
    pub fn with_hooks(hooks: Vec<Hook>) -> Self {
        let last = hooks.iter().map(|h| h.id).max().unwrap_or(0);
        Self {
            hooks: Mutex::new(hooks),
            last_id: Mutex::new(last),
            ..Self::default()
        }
    }

    /// Make every delete fail with a server error.
    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn hooks(&self) -> Vec<Hook> {
        self.hooks.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().unwrap().clone()
    }

    fn to_hook(id: u64, spec: &HookSpec) -> Hook {
        Hook {
            id,
            name: spec.name.clone(),
            active: spec.active.unwrap_or(true),
            events: spec.events.clone().unwrap_or_default(),
            config: spec.config.clone(),
        }
    }
}

#[async_trait]
impl HookApi for FakeHooks {
    async fn list_hooks(&self) -> Result<Vec<Hook>> {
        self.calls.lock().unwrap().push(HookCall::List);
        Ok(self.hooks())
    }

    async fn create_hook(&self, spec: &HookSpec) -> Result<Hook> {
        self.calls
            .lock()
            .unwrap()
            .push(HookCall::Create(spec.url().to_string()));
        let id = {
            let mut last = self.last_id.lock().unwrap();
            *last += 1;
            *last
        };
        let created = Self::to_hook(id, spec);
        self.hooks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_hook(&self, id: u64, spec: &HookSpec) -> Result<Hook> {
        self.calls.lock().unwrap().push(HookCall::Update(id));
        let updated = Self::to_hook(id, spec);
        let mut hooks = self.hooks.lock().unwrap();
        let slot = hooks
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| Error::NotFound(format!("hook {id}")))?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_hook(&self, id: u64) -> Result<()> {
        self.calls.lock().unwrap().push(HookCall::Delete(id));
        if self.fail_deletes {
            return Err(Error::Api {
                status: 500,
                message: "boom".into(),
            });
        }
        self.hooks.lock().unwrap().retain(|h| h.id != id);
        Ok(())
    }
}
