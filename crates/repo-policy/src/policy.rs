//! Policy documents
//!
//! A policy is an ordered list of goals. On disk it is a sequence of
//! single-key objects, where the key names the goal and the value is that
//! goal's configuration:
//!
//! ```json
//! [
//!   { "file": { "state": "present", "path": "a.txt", "content": "x", "ref": "refs/heads/main" } },
//!   { "env_var": { "state": "absent", "name": "LEGACY_TOKEN" } }
//! ]
//! ```
//!
//! Goal configuration is kept opaque until the handler for that goal parses it.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::document::{DocumentFormat, load_document};
use crate::{Error, Result};

/// Declared state of a reconciled resource.
///
/// Any other value in a payload's `state` field fails to parse, which
/// surfaces as a configuration error for that goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    Present,
    Absent,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Present => f.write_str("present"),
            DesiredState::Absent => f.write_str("absent"),
        }
    }
}

/// Raw, uninterpreted configuration attached to a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalConfig(Value);

impl GoalConfig {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The raw payload.
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Parse the payload into a handler-specific type.
    ///
    /// `kind` names the payload in the error message.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the payload does not match `T`.
    pub fn parse<T: DeserializeOwned>(&self, kind: &'static str) -> Result<T> {
        T::deserialize(&self.0).map_err(|e| Error::InvalidConfig {
            kind,
            message: e.to_string(),
        })
    }
}

impl From<Value> for GoalConfig {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// One goal of a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyGoal {
    pub goal: String,
    pub config: GoalConfig,
}

impl PolicyGoal {
    pub fn new(goal: impl Into<String>, config: impl Into<GoalConfig>) -> Self {
        Self {
            goal: goal.into(),
            config: config.into(),
        }
    }
}

/// An ordered, immutable list of goals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    goals: Vec<PolicyGoal>,
}

impl Policy {
    pub fn new(goals: Vec<PolicyGoal>) -> Self {
        Self { goals }
    }

    /// Build a policy from parsed single-key objects.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolicy` if any entry does not have exactly one key.
    pub fn from_entries(entries: Vec<Map<String, Value>>) -> Result<Self> {
        let goals = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                if entry.len() != 1 {
                    return Err(Error::InvalidPolicy {
                        message: format!(
                            "entry {index} has {} keys, expected exactly one goal name",
                            entry.len()
                        ),
                    });
                }
                let (goal, config) = entry.into_iter().next().ok_or_else(|| {
                    Error::InvalidPolicy {
                        message: format!("entry {index} is empty"),
                    }
                })?;
                Ok(PolicyGoal::new(goal, config))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { goals })
    }

    /// Parse a policy document in the given format.
    pub fn parse(format: DocumentFormat, data: &str) -> Result<Self> {
        let entries = format
            .parse::<Vec<Map<String, Value>>>(data)
            .map_err(Self::not_a_sequence)?;
        Self::from_entries(entries)
    }

    /// Goal names in execution order.
    pub fn goals(&self) -> Vec<&str> {
        self.goals.iter().map(|g| g.goal.as_str()).collect()
    }

    /// Iterate over goals in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &PolicyGoal> {
        self.goals.iter()
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    fn not_a_sequence(err: Error) -> Error {
        match err {
            Error::Json(e) => Error::InvalidPolicy {
                message: e.to_string(),
            },
            Error::Yaml(e) => Error::InvalidPolicy {
                message: e.to_string(),
            },
            other => other,
        }
    }
}

/// Load a policy from `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read and `InvalidPolicy` if it
/// is not a sequence of single-key objects.
pub fn load_policy(path: &Path) -> Result<Policy> {
    let entries: Vec<Map<String, Value>> = load_document(path).map_err(|e| match e {
        Error::Io(e) => Error::Io(e),
        other => Policy::not_a_sequence(other),
    })?;

    Policy::from_entries(entries).map_err(|e| match e {
        Error::InvalidPolicy { message } => Error::InvalidPolicy {
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    })
}
