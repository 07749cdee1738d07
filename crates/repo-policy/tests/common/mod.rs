//! Shared handlers for repo-policy tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use repo_policy::{
    Error, Facts, GoalConfig, GoalHandler, GoalOutcome, HandlerFactory, Result, keys,
};
use serde_json::Value;

/// One recorded `apply` call: (target url, goal, payload).
pub type Call = (String, String, Value);

/// Handler that records every call and fails when the payload says so.
///
/// Payload `{"bar": "baz"}` succeeds unchanged, `{"change": "..."}` succeeds
/// with a change, anything with `"fail": true` returns an error.
pub struct RecordingHandler {
    target: String,
    calls: Arc<Mutex<Vec<Call>>>,
}

#[async_trait]
impl GoalHandler for RecordingHandler {
    async fn apply(&mut self, goal: &str, config: &GoalConfig) -> Result<GoalOutcome> {
        self.calls.lock().unwrap().push((
            self.target.clone(),
            goal.to_string(),
            config.raw().clone(),
        ));

        let raw = config.raw();
        if raw.get("fail").and_then(Value::as_bool).unwrap_or(false) {
            return Err(Error::handler(format!("{goal} was told to fail")));
        }
        match raw.get("change").and_then(Value::as_str) {
            Some(action) => Ok(GoalOutcome::changed(action)),
            None => Ok(GoalOutcome::Unchanged),
        }
    }
}

/// Factory for [`RecordingHandler`] sharing one call log.
#[derive(Clone, Default)]
pub struct RecordingFactory {
    pub calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingFactory {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn goals_for(&self, target: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(t, _, _)| t == target)
            .map(|(_, goal, _)| goal)
            .collect()
    }
}

#[async_trait]
impl HandlerFactory for RecordingFactory {
    async fn create(&self, facts: &Facts) -> Result<Box<dyn GoalHandler>> {
        Ok(Box::new(RecordingHandler {
            target: facts.get_string(keys::REPO_URL)?.to_string(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// Factory that refuses to build a handler for one repository name.
pub struct PickyFactory {
    pub inner: RecordingFactory,
    pub refuse: String,
}

#[async_trait]
impl HandlerFactory for PickyFactory {
    async fn create(&self, facts: &Facts) -> Result<Box<dyn GoalHandler>> {
        if facts.get_string(keys::REPO_NAME)? == self.refuse {
            return Err(Error::handler("repository is not registered"));
        }
        self.inner.create(facts).await
    }
}
