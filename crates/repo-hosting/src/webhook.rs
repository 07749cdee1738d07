//! Webhook reconciliation
//!
//! Hooks are matched by their delivery URL (`config.url`). Duplicates are
//! left alone: the first listed hook with a matching URL is the one that gets
//! updated or deleted.

use std::sync::Arc;

use async_trait::async_trait;
use repo_policy::{DesiredState, GoalConfig, GoalOutcome};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Hook name used when the payload does not set one.
pub const DEFAULT_HOOK_NAME: &str = "web";

/// A webhook as listed by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Hook {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl Hook {
    /// Delivery URL, if configured.
    pub fn url(&self) -> Option<&str> {
        self.config.get("url").and_then(Value::as_str)
    }
}

/// Desired hook definition sent on create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookSpec {
    pub name: String,
    pub config: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl HookSpec {
    pub fn url(&self) -> &str {
        self.config.get("url").and_then(Value::as_str).unwrap_or_default()
    }
}

/// Payload of a `webhook` goal.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HookParams {
    state: DesiredState,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    config: Map<String, Value>,
    #[serde(default)]
    events: Option<Vec<String>>,
    #[serde(default)]
    active: Option<bool>,
}

/// A parsed `webhook` goal.
#[derive(Debug, Clone, PartialEq)]
pub struct HookGoal {
    pub state: DesiredState,
    pub spec: HookSpec,
}

impl HookGoal {
    /// Parse a `webhook` payload.
    ///
    /// A top-level `url` is shorthand for `config.url`. The hook name
    /// defaults to [`DEFAULT_HOOK_NAME`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unknown `state`, unknown fields, or a
    /// hook with no URL.
    pub fn parse(config: &GoalConfig) -> repo_policy::Result<Self> {
        let params: HookParams = config.parse("webhook")?;

        let mut hook_config = params.config;
        if let Some(url) = params.url {
            hook_config.insert("url".to_string(), Value::String(url));
        }
        if !hook_config.get("url").is_some_and(Value::is_string) {
            return Err(repo_policy::Error::InvalidConfig {
                kind: "webhook",
                message: "hook has no url".to_string(),
            });
        }

        Ok(Self {
            state: params.state,
            spec: HookSpec {
                name: params.name.unwrap_or_else(|| DEFAULT_HOOK_NAME.to_string()),
                config: hook_config,
                events: params.events,
                active: params.active,
            },
        })
    }
}

/// Webhook operations on one repository.
#[async_trait]
pub trait HookApi: Send + Sync {
    async fn list_hooks(&self) -> Result<Vec<Hook>>;
    async fn create_hook(&self, spec: &HookSpec) -> Result<Hook>;
    async fn update_hook(&self, id: u64, spec: &HookSpec) -> Result<Hook>;
    async fn delete_hook(&self, id: u64) -> Result<()>;
}

#[async_trait]
impl<T: HookApi + ?Sized> HookApi for Arc<T> {
    async fn list_hooks(&self) -> Result<Vec<Hook>> {
        (**self).list_hooks().await
    }

    async fn create_hook(&self, spec: &HookSpec) -> Result<Hook> {
        (**self).create_hook(spec).await
    }

    async fn update_hook(&self, id: u64, spec: &HookSpec) -> Result<Hook> {
        (**self).update_hook(id, spec).await
    }

    async fn delete_hook(&self, id: u64) -> Result<()> {
        (**self).delete_hook(id).await
    }
}

/// Reconciles `webhook` goals, listing the repository's hooks once.
pub struct HookReconciler<A> {
    api: A,
    hooks: Option<Vec<Hook>>,
}

impl<A: HookApi> HookReconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api, hooks: None }
    }

    async fn hooks(&mut self) -> Result<&mut Vec<Hook>> {
        if self.hooks.is_none() {
            let listed = self.api.list_hooks().await?;
            tracing::debug!(count = listed.len(), "Listed webhooks");
            self.hooks = Some(listed);
        }
        Ok(self.hooks.get_or_insert_with(Vec::new))
    }

    /// Make the repository's hooks match `goal`.
    pub async fn apply(&mut self, goal: &HookGoal) -> Result<GoalOutcome> {
        let url = goal.spec.url().to_string();
        let hooks = self.hooks().await?;
        let existing = hooks.iter().position(|h| h.url() == Some(url.as_str()));

        match (goal.state, existing) {
            (DesiredState::Present, None) => {
                let created = self.api.create_hook(&goal.spec).await?;
                tracing::info!(hook_url = %url, id = created.id, "Created webhook");
                self.hooks().await?.push(created);
                Ok(GoalOutcome::changed(format!("created webhook {url}")))
            }
            (DesiredState::Present, Some(index)) => {
                let id = hooks[index].id;
                let updated = self.api.update_hook(id, &goal.spec).await?;
                tracing::info!(hook_url = %url, id, "Updated webhook");
                self.hooks().await?[index] = updated;
                Ok(GoalOutcome::changed(format!("updated webhook {url}")))
            }
            (DesiredState::Absent, Some(index)) => {
                let id = hooks[index].id;
                self.api.delete_hook(id).await?;
                tracing::info!(hook_url = %url, id, "Deleted webhook");
                self.hooks().await?.remove(index);
                Ok(GoalOutcome::changed(format!("deleted webhook {url}")))
            }
            (DesiredState::Absent, None) => {
                tracing::debug!(hook_url = %url, "Webhook already absent");
                Ok(GoalOutcome::Unchanged)
            }
        }
    }
}
