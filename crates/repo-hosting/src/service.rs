//! GitHub goal handler and its factory

use std::sync::Arc;

use async_trait::async_trait;
use repo_git::GitDataStore;
use repo_policy::{
    Error as PolicyError, Facts, GoalConfig, GoalHandler, GoalOutcome, HandlerBundle,
    HandlerFactory, keys,
};

use crate::client::{DEFAULT_API_URL, GithubClient};
use crate::file::{FileGoal, FileReconciler};
use crate::webhook::{HookApi, HookGoal, HookReconciler};

/// Goal names for file reconciliation.
pub const FILE_GOALS: [&str; 2] = ["github_file", "file"];
/// Goal names for webhook reconciliation.
pub const WEBHOOK_GOALS: [&str; 2] = ["github_webhook", "webhook"];

/// Handles file and webhook goals for one repository.
///
/// Both reconcilers share one client. Fetched trees and listed hooks are
/// cached for the lifetime of the handler.
pub struct GithubService<C> {
    files: FileReconciler<C>,
    hooks: HookReconciler<Arc<C>>,
}

impl<C: GitDataStore + HookApi + 'static> GithubService<C> {
    pub fn new(client: C) -> Self {
        let client = Arc::new(client);
        Self {
            files: FileReconciler::new(Arc::clone(&client)),
            hooks: HookReconciler::new(client),
        }
    }
}

#[async_trait]
impl<C: GitDataStore + HookApi + 'static> GoalHandler for GithubService<C> {
    async fn apply(&mut self, goal: &str, config: &GoalConfig) -> repo_policy::Result<GoalOutcome> {
        if FILE_GOALS.contains(&goal) {
            let file = FileGoal::parse(config)?;
            Ok(self.files.apply(&file).await?)
        } else if WEBHOOK_GOALS.contains(&goal) {
            let hook = HookGoal::parse(config)?;
            Ok(self.hooks.apply(&hook).await?)
        } else {
            Err(PolicyError::UnknownGoal {
                goal: goal.to_string(),
            })
        }
    }
}

/// Builds a [`GithubService`] over the GitHub API.
///
/// Requires `github.access_token`; `github.api_url` overrides the public API
/// endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct GithubServiceFactory;

#[async_trait]
impl HandlerFactory for GithubServiceFactory {
    async fn create(&self, facts: &Facts) -> repo_policy::Result<Box<dyn GoalHandler>> {
        let token = facts
            .optional_string(keys::GITHUB_ACCESS_TOKEN)?
            .ok_or_else(|| PolicyError::handler("no github access token available"))?;
        let api_url = facts
            .optional_string(keys::GITHUB_API_URL)?
            .unwrap_or(DEFAULT_API_URL);

        let client = GithubClient::new(
            api_url,
            token,
            facts.get_string(keys::REPO_OWNER)?,
            facts.get_string(keys::REPO_NAME)?,
        )?;
        tracing::debug!(api_url = %api_url, "Created GitHub client");
        Ok(Box::new(GithubService::new(client)))
    }
}

/// All GitHub goal names bound to [`GithubServiceFactory`].
pub fn bundle() -> HandlerBundle {
    HandlerBundle::new(
        FILE_GOALS.into_iter().chain(WEBHOOK_GOALS),
        GithubServiceFactory,
    )
}
