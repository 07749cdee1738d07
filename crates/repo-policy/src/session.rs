//! Execution session - applies one policy to one target
//!
//! A session resolves handlers for every goal in the policy, then applies the
//! goals strictly in order. The first failing goal stops the session; goals
//! applied before it stay applied.

use std::sync::Arc;

use tracing::Instrument;

use crate::facts::{Facts, keys};
use crate::handler::GoalOutcome;
use crate::policy::Policy;
use crate::registry::GoalRegistry;
use crate::{Error, Result};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Running,
    Completed,
    Failed,
}

/// A goal that changed remote state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalChange {
    pub goal: String,
    pub action: String,
}

/// Summary of a completed session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Target URL the policy was applied to
    pub target: String,
    /// Number of goals applied
    pub goals_applied: usize,
    /// Goals that changed remote state, in policy order
    pub changes: Vec<GoalChange>,
}

/// Binds a policy and one target's facts to the goal registry.
pub struct Session {
    policy: Arc<Policy>,
    facts: Facts,
    registry: Arc<GoalRegistry>,
    state: SessionState,
}

impl Session {
    /// Create a session for the target described by `facts`.
    pub fn new(policy: Arc<Policy>, facts: Facts, registry: Arc<GoalRegistry>) -> Self {
        Self {
            policy,
            facts,
            registry,
            state: SessionState::Created,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The target URL, or `<unknown>` if no repository facts were set.
    pub fn target(&self) -> &str {
        self.facts.get_string(keys::REPO_URL).unwrap_or("<unknown>")
    }

    /// Facts the session was created with.
    pub fn facts(&self) -> &Facts {
        &self.facts
    }

    /// Run every goal of the policy in order.
    ///
    /// # Errors
    ///
    /// Fails if handler resolution fails (no goal runs), or with `GoalFailed`
    /// naming the first goal whose handler returned an error.
    ///
    /// # Panics
    ///
    /// Panics if the session has already been run.
    pub async fn run(&mut self) -> Result<SessionReport> {
        assert_eq!(
            self.state,
            SessionState::Created,
            "session for {} has already been run",
            self.target()
        );

        let span = tracing::info_span!("session", repo = %self.target());
        self.state = SessionState::Running;

        let result = self.execute().instrument(span).await;
        self.state = match result {
            Ok(_) => SessionState::Completed,
            Err(_) => SessionState::Failed,
        };
        result
    }

    async fn execute(&self) -> Result<SessionReport> {
        tracing::info!("BEGIN");

        let handlers = self
            .registry
            .resolve(&self.policy.goals(), &self.facts)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "FAILED to resolve handlers"))?;

        let mut report = SessionReport {
            target: self.target().to_string(),
            ..SessionReport::default()
        };

        for policy_goal in self.policy.iter() {
            let goal = policy_goal.goal.as_str();
            tracing::info!(goal = %goal, "Applying goal");

            let handler = handlers.get(goal).ok_or_else(|| Error::UnknownGoal {
                goal: goal.to_string(),
            })?;

            let outcome = handler
                .lock()
                .await
                .apply(goal, &policy_goal.config)
                .await
                .map_err(|e| {
                    tracing::error!(goal = %goal, error = %e, "FAILED");
                    Error::GoalFailed {
                        goal: goal.to_string(),
                        source: Box::new(e),
                    }
                })?;

            report.goals_applied += 1;
            match outcome {
                GoalOutcome::Unchanged => tracing::debug!(goal = %goal, "Already satisfied"),
                GoalOutcome::Changed(action) => {
                    tracing::info!(goal = %goal, action = %action, "Changed");
                    report.changes.push(GoalChange {
                        goal: goal.to_string(),
                        action,
                    });
                }
            }
        }

        tracing::info!(changes = report.changes.len(), "END");
        Ok(report)
    }
}
