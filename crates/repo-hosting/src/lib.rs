//! GitHub reconciliation for repo-policy
//!
//! Serves two families of goals against one repository:
//!
//! - `github_file` / `file`: make a path on a ref hold given content, or
//!   remove it, by writing a new tree and committing it only if the tree
//!   changed.
//! - `github_webhook` / `webhook`: create, update or delete a webhook
//!   matched by its delivery URL.
//!
//! Register [`bundle()`] with a goal registry to enable them.

pub mod client;
pub mod error;
pub mod file;
pub mod service;
pub mod webhook;

pub use client::{DEFAULT_API_URL, GithubClient};
pub use error::{Error, Result};
pub use file::{DEFAULT_REF, FileGoal, FileReconciler, FileState};
pub use service::{FILE_GOALS, GithubService, GithubServiceFactory, WEBHOOK_GOALS, bundle};
pub use webhook::{DEFAULT_HOOK_NAME, Hook, HookApi, HookGoal, HookReconciler, HookSpec};
