//! Run coordinator - applies one policy to many targets
//!
//! Every target gets its own facts and its own session, spawned as an
//! independent task. A failing target never affects its siblings; all
//! outcomes are collected once every task has finished.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::facts::{FactMap, Facts};
use crate::policy::Policy;
use crate::registry::GoalRegistry;
use crate::repository::Repository;
use crate::session::{Session, SessionReport};
use crate::{Error, Result};

/// Result of applying the policy to one target.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: Repository,
    pub result: Result<SessionReport>,
}

impl TargetOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes for every target, in the order targets were given.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<TargetOutcome>,
}

impl RunSummary {
    /// Outcomes whose session completed.
    pub fn succeeded(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    /// Outcomes whose session failed.
    pub fn failed(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Whether every target completed.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(TargetOutcome::is_success)
    }
}

/// Applies a shared policy to a set of targets concurrently.
pub struct Coordinator {
    registry: Arc<GoalRegistry>,
    policy: Arc<Policy>,
    defaults: FactMap,
    concurrency: Option<usize>,
}

impl Coordinator {
    pub fn new(registry: Arc<GoalRegistry>, policy: Arc<Policy>) -> Self {
        Self {
            registry,
            policy,
            defaults: FactMap::new(),
            concurrency: None,
        }
    }

    /// Facts seeded into every target before its identity.
    pub fn with_defaults(mut self, defaults: FactMap) -> Self {
        self.defaults = defaults;
        self
    }

    /// Cap the number of sessions running at once. Unbounded by default.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit.max(1));
        self
    }

    /// Build the facts for one target: defaults, then `repo.*`.
    pub fn facts_for(&self, target: &Repository) -> Facts {
        let mut builder = Facts::builder();
        builder.merge(self.defaults.clone()).set_repository(target);
        builder.build()
    }

    /// Run a session per target and wait for all of them.
    pub async fn run(&self, targets: Vec<Repository>) -> RunSummary {
        let limiter = self.concurrency.map(|n| Arc::new(Semaphore::new(n)));

        let handles: Vec<_> = targets
            .into_iter()
            .map(|target| {
                let mut session = Session::new(
                    Arc::clone(&self.policy),
                    self.facts_for(&target),
                    Arc::clone(&self.registry),
                );
                let limiter = limiter.clone();

                let handle = tokio::spawn(async move {
                    let _permit = match limiter {
                        Some(semaphore) => Some(semaphore.acquire_owned().await.map_err(|e| {
                            Error::TaskFailed {
                                target: session.target().to_string(),
                                message: e.to_string(),
                            }
                        })?),
                        None => None,
                    };
                    session.run().await
                });
                (target, handle)
            })
            .collect();

        let mut summary = RunSummary::default();
        for (target, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::TaskFailed {
                    target: target.to_string(),
                    message: e.to_string(),
                }),
            };

            match &result {
                Ok(report) => tracing::info!(
                    repo = %target,
                    changes = report.changes.len(),
                    "Target completed"
                ),
                Err(e) => tracing::error!(repo = %target, error = %e, "Target failed"),
            }

            summary.outcomes.push(TargetOutcome { target, result });
        }
        summary
    }
}
