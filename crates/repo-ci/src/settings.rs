//! Repository settings overwrite
//!
//! Settings are not compared with the live values; every goal results in
//! one update call carrying the fields the payload sets.

use std::sync::Arc;

use async_trait::async_trait;
use repo_policy::{GoalConfig, GoalOutcome};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Editable repository settings. Unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositorySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builds_only_with_travis_yml: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_pushes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_pull_requests: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_number_of_builds: Option<u32>,
}

impl RepositorySettings {
    /// Parse a `repository_settings` payload.
    pub fn parse(config: &GoalConfig) -> repo_policy::Result<Self> {
        config.parse("repository_settings")
    }
}

/// Settings operations on one repository.
#[async_trait]
pub trait SettingsApi: Send + Sync {
    async fn update_settings(&self, settings: &RepositorySettings) -> Result<()>;
}

#[async_trait]
impl<T: SettingsApi + ?Sized> SettingsApi for Arc<T> {
    async fn update_settings(&self, settings: &RepositorySettings) -> Result<()> {
        (**self).update_settings(settings).await
    }
}

/// Send `settings` unconditionally.
pub async fn apply_settings<A: SettingsApi>(api: &A, settings: &RepositorySettings) -> Result<GoalOutcome> {
    api.update_settings(settings).await?;
    tracing::info!(?settings, "Updated repository settings");
    Ok(GoalOutcome::changed("updated repository settings"))
}
