//! Goal handler traits
//!
//! A handler reconciles one or more goal names against live remote state.
//! Handlers are built per session by a [`HandlerFactory`], and may cache
//! remote state for as long as the session lives.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::Result;
use crate::facts::Facts;
use crate::policy::GoalConfig;

/// What applying a goal did to remote state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalOutcome {
    /// Remote state already matched.
    Unchanged,
    /// Remote state was mutated; the string describes how.
    Changed(String),
}

impl GoalOutcome {
    pub fn changed(action: impl Into<String>) -> Self {
        GoalOutcome::Changed(action.into())
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, GoalOutcome::Changed(_))
    }
}

impl fmt::Display for GoalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalOutcome::Unchanged => f.write_str("unchanged"),
            GoalOutcome::Changed(action) => f.write_str(action),
        }
    }
}

/// Reconciles goals against an external system.
#[async_trait]
pub trait GoalHandler: Send {
    /// Apply `goal` with its raw configuration.
    async fn apply(&mut self, goal: &str, config: &GoalConfig) -> Result<GoalOutcome>;
}

/// Builds a handler from a session's facts.
#[async_trait]
pub trait HandlerFactory: Send + Sync {
    async fn create(&self, facts: &Facts) -> Result<Box<dyn GoalHandler>>;
}

/// A handler instance shared by every goal name bound to its factory.
pub type SharedHandler = Arc<Mutex<Box<dyn GoalHandler>>>;

/// A factory together with the goal names it serves.
#[derive(Clone)]
pub struct HandlerBundle {
    pub goals: Vec<String>,
    pub factory: Arc<dyn HandlerFactory>,
}

impl HandlerBundle {
    pub fn new<I, S>(goals: I, factory: impl HandlerFactory + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            goals: goals.into_iter().map(Into::into).collect(),
            factory: Arc::new(factory),
        }
    }
}

impl fmt::Debug for HandlerBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBundle")
            .field("goals", &self.goals)
            .finish_non_exhaustive()
    }
}
