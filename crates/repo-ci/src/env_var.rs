//! Environment variable reconciliation
//!
//! Travis does not enforce unique variable names, so a repository can hold
//! several variables called the same thing. Reconciling a name leaves at
//! most one behind: the last listed match is kept and updated, the others
//! are deleted.

use std::sync::Arc;

use async_trait::async_trait;
use repo_policy::{DesiredState, GoalConfig, GoalOutcome};
use serde::{Deserialize, Serialize};

use crate::Result;

/// An environment variable as listed by the service.
///
/// The value of a private variable is never returned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnvVar {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub public: bool,
}

/// Desired variable definition sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvVarSpec {
    pub name: String,
    pub value: String,
    pub public: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnvVarParams {
    state: DesiredState,
    name: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    public: bool,
}

/// A parsed `env_var` goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVarGoal {
    pub state: DesiredState,
    pub spec: EnvVarSpec,
}

impl EnvVarGoal {
    /// Parse an `env_var` payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unknown `state`, unknown fields, an
    /// empty name, or a `present` goal without a value.
    pub fn parse(config: &GoalConfig) -> repo_policy::Result<Self> {
        let params: EnvVarParams = config.parse("env_var")?;
        let invalid = |message: &str| repo_policy::Error::InvalidConfig {
            kind: "env_var",
            message: message.to_string(),
        };

        if params.name.is_empty() {
            return Err(invalid("env var has an empty name"));
        }
        let value = match (params.state, params.value) {
            (DesiredState::Present, None) => return Err(invalid("env var has no value")),
            (_, value) => value.unwrap_or_default(),
        };

        Ok(Self {
            state: params.state,
            spec: EnvVarSpec {
                name: params.name,
                value,
                public: params.public,
            },
        })
    }
}

/// Environment variable operations on one repository.
#[async_trait]
pub trait EnvVarApi: Send + Sync {
    async fn list_env_vars(&self) -> Result<Vec<EnvVar>>;
    async fn create_env_var(&self, spec: &EnvVarSpec) -> Result<EnvVar>;
    async fn update_env_var(&self, id: &str, spec: &EnvVarSpec) -> Result<EnvVar>;
    async fn delete_env_var(&self, id: &str) -> Result<()>;
}

#[async_trait]
impl<T: EnvVarApi + ?Sized> EnvVarApi for Arc<T> {
    async fn list_env_vars(&self) -> Result<Vec<EnvVar>> {
        (**self).list_env_vars().await
    }

    async fn create_env_var(&self, spec: &EnvVarSpec) -> Result<EnvVar> {
        (**self).create_env_var(spec).await
    }

    async fn update_env_var(&self, id: &str, spec: &EnvVarSpec) -> Result<EnvVar> {
        (**self).update_env_var(id, spec).await
    }

    async fn delete_env_var(&self, id: &str) -> Result<()> {
        (**self).delete_env_var(id).await
    }
}

/// Reconciles `env_var` goals against a local mirror of the remote list.
///
/// The list is fetched on first use. Every change is made remotely first
/// and mirrored locally only once the remote call succeeds.
pub struct EnvVarReconciler<A> {
    api: A,
    vars: Option<Vec<EnvVar>>,
}

impl<A: EnvVarApi> EnvVarReconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api, vars: None }
    }

    async fn vars(&mut self) -> Result<&mut Vec<EnvVar>> {
        if self.vars.is_none() {
            let listed = self.api.list_env_vars().await?;
            tracing::debug!(count = listed.len(), "Listed env vars");
            self.vars = Some(listed);
        }
        Ok(self.vars.get_or_insert_with(Vec::new))
    }

    /// Every cached variable called `name`, in listing order.
    pub async fn by_name(&mut self, name: &str) -> Result<Vec<EnvVar>> {
        Ok(self
            .vars()
            .await?
            .iter()
            .filter(|v| v.name == name)
            .cloned()
            .collect())
    }

    async fn ids_named(&mut self, name: &str) -> Result<Vec<String>> {
        Ok(self.by_name(name).await?.into_iter().map(|v| v.id).collect())
    }

    async fn remove(&mut self, id: &str) -> Result<()> {
        self.api.delete_env_var(id).await?;
        self.vars().await?.retain(|v| v.id != id);
        Ok(())
    }

    /// Make the repository's variables match `goal`.
    pub async fn apply(&mut self, goal: &EnvVarGoal) -> Result<GoalOutcome> {
        let name = goal.spec.name.as_str();
        let ids = self.ids_named(name).await?;

        match goal.state {
            DesiredState::Present => match ids.split_last() {
                None => {
                    let created = self.api.create_env_var(&goal.spec).await?;
                    tracing::info!(env_var = %name, id = %created.id, "Created env var");
                    self.vars().await?.push(created);
                    Ok(GoalOutcome::changed(format!("created env var {name}")))
                }
                Some((canonical, duplicates)) => {
                    let updated = self.api.update_env_var(canonical, &goal.spec).await?;
                    tracing::info!(env_var = %name, id = %canonical, "Updated env var");
                    if let Some(slot) = self.vars().await?.iter_mut().find(|v| v.id == *canonical) {
                        *slot = updated;
                    }

                    for id in duplicates {
                        self.remove(id).await?;
                        tracing::info!(env_var = %name, id = %id, "Deleted duplicate env var");
                    }

                    Ok(GoalOutcome::changed(match duplicates.len() {
                        0 => format!("updated env var {name}"),
                        n => format!("updated env var {name}, removed {n} duplicate(s)"),
                    }))
                }
            },
            DesiredState::Absent => {
                if ids.is_empty() {
                    tracing::debug!(env_var = %name, "Env var already absent");
                    return Ok(GoalOutcome::Unchanged);
                }
                for id in &ids {
                    self.remove(id).await?;
                    tracing::info!(env_var = %name, id = %id, "Deleted env var");
                }
                Ok(GoalOutcome::changed(format!(
                    "deleted {} env var(s) named {name}",
                    ids.len()
                )))
            }
        }
    }
}
