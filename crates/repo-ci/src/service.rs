//! Travis goal handler and its factory

use std::sync::Arc;

use async_trait::async_trait;
use repo_policy::{
    Error as PolicyError, Facts, GoalConfig, GoalHandler, GoalOutcome, HandlerBundle,
    HandlerFactory, keys,
};

use crate::client::{ORG_API_URL, PRO_API_URL, TravisClient};
use crate::env_var::{EnvVarApi, EnvVarGoal, EnvVarReconciler};
use crate::settings::{RepositorySettings, SettingsApi, apply_settings};
use crate::Error;

/// Goal names for environment variable reconciliation.
pub const ENV_VAR_GOALS: [&str; 2] = ["travis_env_var", "env_var"];
/// Goal names for the repository settings overwrite.
pub const SETTINGS_GOALS: [&str; 2] = ["travis_repository_settings", "repository_settings"];

/// Handles env var and settings goals for one repository.
pub struct TravisService<C> {
    client: Arc<C>,
    env_vars: EnvVarReconciler<Arc<C>>,
}

impl<C: EnvVarApi + SettingsApi + 'static> TravisService<C> {
    pub fn new(client: C) -> Self {
        let client = Arc::new(client);
        Self {
            env_vars: EnvVarReconciler::new(Arc::clone(&client)),
            client,
        }
    }
}

#[async_trait]
impl<C: EnvVarApi + SettingsApi + 'static> GoalHandler for TravisService<C> {
    async fn apply(&mut self, goal: &str, config: &GoalConfig) -> repo_policy::Result<GoalOutcome> {
        if ENV_VAR_GOALS.contains(&goal) {
            let env_var = EnvVarGoal::parse(config)?;
            Ok(self.env_vars.apply(&env_var).await?)
        } else if SETTINGS_GOALS.contains(&goal) {
            let settings = RepositorySettings::parse(config)?;
            Ok(apply_settings(&self.client, &settings).await?)
        } else {
            Err(PolicyError::UnknownGoal {
                goal: goal.to_string(),
            })
        }
    }
}

/// One Travis endpoint and the facts that configure it.
struct Endpoint {
    label: &'static str,
    token_key: &'static str,
    url_key: &'static str,
    default_url: &'static str,
}

/// Tried in order; the first that resolves the repository wins.
const ENDPOINTS: [Endpoint; 2] = [
    Endpoint {
        label: "pro",
        token_key: keys::TRAVIS_PRO_TOKEN,
        url_key: keys::TRAVIS_PRO_URL,
        default_url: PRO_API_URL,
    },
    Endpoint {
        label: "org",
        token_key: keys::TRAVIS_ORG_TOKEN,
        url_key: keys::TRAVIS_ORG_URL,
        default_url: ORG_API_URL,
    },
];

/// Resolve the repository on the first usable endpoint.
///
/// # Errors
///
/// Returns `NotConfigured` when no endpoint has a token or none of them
/// knows the repository.
pub async fn connect(facts: &Facts) -> repo_policy::Result<TravisClient> {
    let owner = facts.get_string(keys::REPO_OWNER)?;
    let name = facts.get_string(keys::REPO_NAME)?;
    let mut failures = Vec::new();

    for endpoint in &ENDPOINTS {
        let Some(token) = facts.optional_string(endpoint.token_key)? else {
            failures.push(format!("{}: no token", endpoint.label));
            continue;
        };
        let url = facts
            .optional_string(endpoint.url_key)?
            .unwrap_or(endpoint.default_url);

        match TravisClient::connect(url, token, owner, name).await {
            Ok(client) => {
                tracing::debug!(
                    endpoint = endpoint.label,
                    repository_id = client.repository_id(),
                    "Created Travis client"
                );
                return Ok(client);
            }
            Err(e) => {
                tracing::debug!(endpoint = endpoint.label, error = %e, "Travis endpoint unusable");
                failures.push(format!("{}: {e}", endpoint.label));
            }
        }
    }

    Err(Error::NotConfigured {
        slug: format!("{owner}/{name}"),
        reason: failures.join("; "),
    }
    .into())
}

/// Builds a [`TravisService`] over whichever Travis endpoint knows the
/// repository, trying `travis.pro_token` before `travis.org_token`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TravisServiceFactory;

#[async_trait]
impl HandlerFactory for TravisServiceFactory {
    async fn create(&self, facts: &Facts) -> repo_policy::Result<Box<dyn GoalHandler>> {
        let client = connect(facts).await?;
        Ok(Box::new(TravisService::new(client)))
    }
}

/// All Travis goal names bound to [`TravisServiceFactory`].
pub fn bundle() -> HandlerBundle {
    HandlerBundle::new(
        ENV_VAR_GOALS.into_iter().chain(SETTINGS_GOALS),
        TravisServiceFactory,
    )
}
