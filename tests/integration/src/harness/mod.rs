//! A simulated remote world for end-to-end policy runs
//!
//! Every target repository is a real git repository on disk, served through
//! [`LocalGitStore`]. Hooks, env vars and settings live in memory next to it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use repo_ci::{
    ENV_VAR_GOALS, EnvVar, EnvVarApi, EnvVarSpec, RepositorySettings, SETTINGS_GOALS,
    SettingsApi, TravisService,
};
use repo_git::{Commit, GitDataStore, LocalGitStore, NewTreeEntry, Sha, Tree};
use repo_hosting::{FILE_GOALS, GithubService, Hook, HookApi, HookSpec, WEBHOOK_GOALS};
use repo_policy::{
    Error as PolicyError, Facts, GoalHandler, GoalRegistry, HandlerBundle, HandlerFactory,
    Repository, keys,
};
use repo_test_utils::git::repo_with_files;
use tempfile::TempDir;

/// Non-git remote state of one repository.
#[derive(Debug, Default)]
pub struct Remote {
    pub hooks: Vec<Hook>,
    pub env_vars: Vec<EnvVar>,
    pub settings_updates: Vec<RepositorySettings>,
    next_id: u64,
}

impl Remote {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type SharedRemote = Arc<Mutex<Remote>>;

/// Hosting backend: local git data plus in-memory hooks.
pub struct LocalGithub {
    store: LocalGitStore,
    remote: SharedRemote,
}

#[async_trait]
impl GitDataStore for LocalGithub {
    async fn get_ref(&self, name: &str) -> repo_git::Result<Sha> {
        self.store.get_ref(name).await
    }

    async fn get_commit(&self, sha: &Sha) -> repo_git::Result<Commit> {
        self.store.get_commit(sha).await
    }

    async fn get_tree(&self, sha: &Sha, recursive: bool) -> repo_git::Result<Tree> {
        self.store.get_tree(sha, recursive).await
    }

    async fn create_tree(&self, entries: &[NewTreeEntry]) -> repo_git::Result<Sha> {
        self.store.create_tree(entries).await
    }

    async fn create_commit(&self, message: &str, tree: &Sha, parents: &[Sha]) -> repo_git::Result<Sha> {
        self.store.create_commit(message, tree, parents).await
    }

    async fn update_ref(&self, name: &str, sha: &Sha) -> repo_git::Result<()> {
        self.store.update_ref(name, sha).await
    }
}

fn to_hook(id: u64, spec: &HookSpec) -> Hook {
    Hook {
        id,
        name: spec.name.clone(),
        active: spec.active.unwrap_or(true),
        events: spec.events.clone().unwrap_or_else(|| vec!["push".into()]),
        config: spec.config.clone(),
    }
}

#[async_trait]
impl HookApi for LocalGithub {
    async fn list_hooks(&self) -> repo_hosting::Result<Vec<Hook>> {
        Ok(self.remote.lock().unwrap().hooks.clone())
    }

    async fn create_hook(&self, spec: &HookSpec) -> repo_hosting::Result<Hook> {
        let mut remote = self.remote.lock().unwrap();
        let hook = to_hook(remote.next_id(), spec);
        remote.hooks.push(hook.clone());
        Ok(hook)
    }

    async fn update_hook(&self, id: u64, spec: &HookSpec) -> repo_hosting::Result<Hook> {
        let mut remote = self.remote.lock().unwrap();
        let slot = remote
            .hooks
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| repo_hosting::Error::NotFound(format!("hook {id}")))?;
        *slot = to_hook(id, spec);
        Ok(slot.clone())
    }

    async fn delete_hook(&self, id: u64) -> repo_hosting::Result<()> {
        self.remote.lock().unwrap().hooks.retain(|h| h.id != id);
        Ok(())
    }
}

/// CI backend over the in-memory env vars and settings.
pub struct LocalTravis {
    remote: SharedRemote,
}

fn to_env_var(id: String, spec: &EnvVarSpec) -> EnvVar {
    EnvVar {
        id,
        name: spec.name.clone(),
        value: Some(spec.value.clone()),
        public: spec.public,
    }
}

#[async_trait]
impl EnvVarApi for LocalTravis {
    async fn list_env_vars(&self) -> repo_ci::Result<Vec<EnvVar>> {
        Ok(self.remote.lock().unwrap().env_vars.clone())
    }

    async fn create_env_var(&self, spec: &EnvVarSpec) -> repo_ci::Result<EnvVar> {
        let mut remote = self.remote.lock().unwrap();
        let var = to_env_var(format!("ev-{}", remote.next_id()), spec);
        remote.env_vars.push(var.clone());
        Ok(var)
    }

    async fn update_env_var(&self, id: &str, spec: &EnvVarSpec) -> repo_ci::Result<EnvVar> {
        let mut remote = self.remote.lock().unwrap();
        let slot = remote
            .env_vars
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| repo_ci::Error::NotFound(format!("env var {id}")))?;
        *slot = to_env_var(id.to_string(), spec);
        Ok(slot.clone())
    }

    async fn delete_env_var(&self, id: &str) -> repo_ci::Result<()> {
        self.remote.lock().unwrap().env_vars.retain(|v| v.id != id);
        Ok(())
    }
}

#[async_trait]
impl SettingsApi for LocalTravis {
    async fn update_settings(&self, settings: &RepositorySettings) -> repo_ci::Result<()> {
        self.remote
            .lock()
            .unwrap()
            .settings_updates
            .push(settings.clone());
        Ok(())
    }
}

/// Target repositories under one temporary root, with their remote state.
pub struct World {
    root: TempDir,
    remotes: Mutex<HashMap<String, SharedRemote>>,
    github_handlers: AtomicUsize,
    travis_handlers: AtomicUsize,
}

impl World {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            root: TempDir::new().unwrap(),
            remotes: Mutex::new(HashMap::new()),
            github_handlers: AtomicUsize::new(0),
            travis_handlers: AtomicUsize::new(0),
        })
    }

    /// Create `octo/<name>` with `files` committed on main.
    pub fn add_repo(&self, name: &str, files: &[(&str, &str)]) -> Repository {
        let path = self.path(name);
        std::fs::create_dir_all(&path).unwrap();
        repo_with_files(&path, files);
        Self::target(name)
    }

    /// A target that has no repository behind it.
    pub fn target(name: &str) -> Repository {
        Repository::parse(&format!("github.com/octo/{name}")).unwrap()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Freshly opened view of the repository on disk.
    pub fn git(&self, name: &str) -> git2::Repository {
        git2::Repository::open(self.path(name)).unwrap()
    }

    pub fn remote(&self, name: &str) -> SharedRemote {
        Arc::clone(self.remotes.lock().unwrap().entry(name.to_string()).or_default())
    }

    pub fn github_handlers(&self) -> usize {
        self.github_handlers.load(Ordering::SeqCst)
    }

    pub fn travis_handlers(&self) -> usize {
        self.travis_handlers.load(Ordering::SeqCst)
    }

    /// Registry serving every goal name from this world.
    pub fn registry(self: &Arc<Self>) -> GoalRegistry {
        GoalRegistry::with_bundles([
            HandlerBundle::new(
                FILE_GOALS.into_iter().chain(WEBHOOK_GOALS),
                GithubFactory(Arc::clone(self)),
            ),
            HandlerBundle::new(
                ENV_VAR_GOALS.into_iter().chain(SETTINGS_GOALS),
                TravisFactory(Arc::clone(self)),
            ),
        ])
    }
}

struct GithubFactory(Arc<World>);

#[async_trait]
impl HandlerFactory for GithubFactory {
    async fn create(&self, facts: &Facts) -> repo_policy::Result<Box<dyn GoalHandler>> {
        let name = facts.get_string(keys::REPO_NAME)?;
        self.0.github_handlers.fetch_add(1, Ordering::SeqCst);
        let store = LocalGitStore::open(self.0.path(name)).map_err(PolicyError::handler)?;
        Ok(Box::new(GithubService::new(LocalGithub {
            store,
            remote: self.0.remote(name),
        })))
    }
}

struct TravisFactory(Arc<World>);

#[async_trait]
impl HandlerFactory for TravisFactory {
    async fn create(&self, facts: &Facts) -> repo_policy::Result<Box<dyn GoalHandler>> {
        let name = facts.get_string(keys::REPO_NAME)?;
        self.0.travis_handlers.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TravisService::new(LocalTravis {
            remote: self.0.remote(name),
        })))
    }
}
