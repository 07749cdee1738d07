//! Travis CI reconciliation for repo-policy
//!
//! Serves two families of goals against one repository:
//!
//! - `travis_env_var` / `env_var`: create, update or delete an environment
//!   variable by name, removing duplicates of the same name on the way.
//! - `travis_repository_settings` / `repository_settings`: overwrite the
//!   repository's build settings.
//!
//! The handler is bound to the repository's numeric Travis id, resolved once
//! when it is built. Register [`bundle()`] with a goal registry to enable it.

pub mod client;
pub mod env_var;
pub mod error;
pub mod service;
pub mod settings;

pub use client::{ORG_API_URL, PRO_API_URL, TravisClient};
pub use env_var::{EnvVar, EnvVarApi, EnvVarGoal, EnvVarReconciler, EnvVarSpec};
pub use error::{Error, Result};
pub use service::{ENV_VAR_GOALS, SETTINGS_GOALS, TravisService, TravisServiceFactory, bundle, connect};
pub use settings::{RepositorySettings, SettingsApi, apply_settings};
