//! Goal registry - maps goal names to handler factories
//!
//! Several goal names may be bound to one factory. When a session resolves
//! its goals, each factory is invoked at most once and the resulting handler
//! is bound to every name that factory serves, so aliased goals share one
//! handler instance (and whatever remote state it has cached).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::facts::Facts;
use crate::handler::{HandlerBundle, HandlerFactory, SharedHandler};
use crate::{Error, Result};

/// Process-wide table of goal names and the factories that serve them.
///
/// Built once at startup from an explicit list of [`HandlerBundle`]s and
/// shared read-only by every session afterwards.
#[derive(Default)]
pub struct GoalRegistry {
    /// Maps goal name to an index into `factories`
    goals: HashMap<String, usize>,
    factories: Vec<Arc<dyn HandlerFactory>>,
}

impl GoalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a list of bundles.
    ///
    /// # Panics
    ///
    /// Panics if two bundles claim the same goal name.
    pub fn with_bundles(bundles: impl IntoIterator<Item = HandlerBundle>) -> Self {
        let mut registry = Self::new();
        for bundle in bundles {
            registry.register_bundle(bundle);
        }
        registry
    }

    /// Register a bundle.
    ///
    /// # Panics
    ///
    /// Panics if any of the bundle's goals is already bound.
    pub fn register_bundle(&mut self, bundle: HandlerBundle) {
        self.register(bundle.goals, bundle.factory);
    }

    /// Bind `goals` to `factory`.
    ///
    /// # Panics
    ///
    /// Panics if any goal name is already bound, or repeated in `goals`.
    pub fn register<I, S>(&mut self, goals: I, factory: Arc<dyn HandlerFactory>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let goals: Vec<String> = goals.into_iter().map(Into::into).collect();

        let mut seen = HashSet::new();
        for goal in &goals {
            if self.goals.contains_key(goal) || !seen.insert(goal.as_str()) {
                panic!("goal '{goal}' was previously defined");
            }
        }

        let index = self.factories.len();
        self.factories.push(factory);
        for goal in goals {
            tracing::debug!(goal = %goal, factory = index, "Registered goal");
            self.goals.insert(goal, index);
        }
    }

    /// All registered goal names, sorted.
    pub fn goals(&self) -> Vec<&str> {
        let mut goals: Vec<&str> = self.goals.keys().map(String::as_str).collect();
        goals.sort_unstable();
        goals
    }

    /// Check if a goal is registered.
    pub fn contains(&self, goal: &str) -> bool {
        self.goals.contains_key(goal)
    }

    /// Number of registered goal names.
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    fn aliases(&self, index: usize) -> impl Iterator<Item = &str> {
        self.goals
            .iter()
            .filter(move |(_, i)| **i == index)
            .map(|(goal, _)| goal.as_str())
    }

    /// Construct handlers for `requested` goals.
    ///
    /// Every requested goal is checked before any factory runs. Each factory
    /// is then invoked at most once, and its handler is bound to all goal
    /// names the factory serves, including ones not in `requested`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownGoal` for an unregistered goal, or `Construction` if a
    /// factory fails.
    pub async fn resolve(&self, requested: &[&str], facts: &Facts) -> Result<ResolvedHandlers> {
        let mut indices = Vec::with_capacity(requested.len());
        for goal in requested {
            let index = self.goals.get(*goal).ok_or_else(|| Error::UnknownGoal {
                goal: goal.to_string(),
            })?;
            indices.push((*goal, *index));
        }

        let mut built: HashMap<usize, SharedHandler> = HashMap::new();
        let mut handlers = HashMap::new();

        for (goal, index) in indices {
            if built.contains_key(&index) {
                continue;
            }

            let handler = self.factories[index]
                .create(facts)
                .await
                .map_err(|e| Error::Construction {
                    goal: goal.to_string(),
                    source: Box::new(e),
                })?;
            let shared: SharedHandler = Arc::new(Mutex::new(handler));

            for alias in self.aliases(index) {
                handlers.insert(alias.to_string(), Arc::clone(&shared));
            }
            built.insert(index, shared);
        }

        Ok(ResolvedHandlers { handlers })
    }
}

/// Handlers constructed for one session, keyed by goal name.
#[derive(Default)]
pub struct ResolvedHandlers {
    handlers: HashMap<String, SharedHandler>,
}

impl ResolvedHandlers {
    /// Get the handler bound to `goal`.
    pub fn get(&self, goal: &str) -> Option<&SharedHandler> {
        self.handlers.get(goal)
    }

    /// Check if a handler is bound to `goal`.
    pub fn contains(&self, goal: &str) -> bool {
        self.handlers.contains_key(goal)
    }

    /// Number of bound goal names.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
