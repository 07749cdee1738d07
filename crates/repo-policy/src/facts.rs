//! Write-once run parameters ("facts")
//!
//! A [`FactsBuilder`] is filled once per target with environment defaults and
//! the target's identity, then finalized into an immutable [`Facts`] value that
//! handler factories read from.
//!
//! Setting a key twice is a wiring defect, not a runtime condition, so it
//! panics instead of returning an error.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::repository::Repository;
use crate::{Error, Result};

/// Well-known fact keys.
pub mod keys {
    pub const REPO_HOST: &str = "repo.host";
    pub const REPO_OWNER: &str = "repo.owner";
    pub const REPO_NAME: &str = "repo.name";
    pub const REPO_URL: &str = "repo.url";

    pub const GITHUB_ACCESS_TOKEN: &str = "github.access_token";
    pub const GITHUB_API_URL: &str = "github.api_url";

    pub const TRAVIS_ORG_TOKEN: &str = "travis.org_token";
    pub const TRAVIS_PRO_TOKEN: &str = "travis.pro_token";
    pub const TRAVIS_ORG_URL: &str = "travis.org_url";
    pub const TRAVIS_PRO_URL: &str = "travis.pro_url";
}

/// A single typed fact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl FactValue {
    fn type_name(&self) -> &'static str {
        match self {
            FactValue::String(_) => "string",
            FactValue::Int(_) => "integer",
            FactValue::Bool(_) => "boolean",
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::String(s) => f.write_str(s),
            FactValue::Int(i) => write!(f, "{i}"),
            FactValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::String(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::String(value)
    }
}

impl From<i64> for FactValue {
    fn from(value: i64) -> Self {
        FactValue::Int(value)
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

/// Ordered map of fact defaults, shared by every target of a run.
pub type FactMap = BTreeMap<String, FactValue>;

/// Collects facts for one target before they are frozen.
#[derive(Debug, Default)]
pub struct FactsBuilder {
    values: FactMap,
}

impl FactsBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `key` has already been set.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FactValue>) -> &mut Self {
        let key = key.into();
        if self.values.contains_key(&key) {
            panic!("fact is known and cannot be reset: '{key}'");
        }
        self.values.insert(key, value.into());
        self
    }

    /// Merge every entry of `defaults`.
    ///
    /// All keys are checked before any is inserted, so a conflict leaves the
    /// builder exactly as it was.
    ///
    /// # Panics
    ///
    /// Panics if any key in `defaults` has already been set, or if `defaults`
    /// names the same key more than once.
    pub fn merge<I, K, V>(&mut self, defaults: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FactValue>,
    {
        let incoming: Vec<(String, FactValue)> = defaults
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut seen = HashSet::with_capacity(incoming.len());
        for (key, _) in &incoming {
            if self.values.contains_key(key) {
                panic!("fact is known and cannot be reset: '{key}'");
            }
            if !seen.insert(key.as_str()) {
                panic!("fact is set twice in one merge: '{key}'");
            }
        }

        self.values.extend(incoming);
        self
    }

    /// Set the `repo.*` facts describing the target repository.
    ///
    /// # Panics
    ///
    /// Panics if any `repo.*` fact has already been set.
    pub fn set_repository(&mut self, repo: &Repository) -> &mut Self {
        self.merge([
            (keys::REPO_HOST, repo.host()),
            (keys::REPO_OWNER, repo.owner()),
            (keys::REPO_NAME, repo.name()),
            (keys::REPO_URL, repo.url()),
        ])
    }

    /// Whether `key` has been set.
    pub fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Freeze the collected facts.
    pub fn build(self) -> Facts {
        Facts {
            values: self.values,
        }
    }
}

/// Immutable facts for one run against one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facts {
    values: FactMap,
}

impl Facts {
    /// Start building a new set of facts.
    pub fn builder() -> FactsBuilder {
        FactsBuilder::new()
    }

    /// Get the raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.values.get(key)
    }

    /// Whether `key` is present.
    pub fn is_available(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get a string fact.
    ///
    /// # Errors
    ///
    /// Returns `FactNotFound` if the key is missing and `FactType` if it holds
    /// a non-string value.
    pub fn get_string(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            FactValue::String(s) => Ok(s),
            other => Err(Self::type_error(key, "string", other)),
        }
    }

    /// Get an integer fact.
    ///
    /// # Errors
    ///
    /// Returns `FactNotFound` if the key is missing and `FactType` if it holds
    /// a non-integer value.
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.require(key)? {
            FactValue::Int(i) => Ok(*i),
            other => Err(Self::type_error(key, "integer", other)),
        }
    }

    /// Get a boolean fact.
    ///
    /// # Errors
    ///
    /// Returns `FactNotFound` if the key is missing and `FactType` if it holds
    /// a non-boolean value.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.require(key)? {
            FactValue::Bool(b) => Ok(*b),
            other => Err(Self::type_error(key, "boolean", other)),
        }
    }

    /// Get a string fact, if present.
    pub fn optional_string(&self, key: &str) -> Result<Option<&str>> {
        if self.is_available(key) {
            self.get_string(key).map(Some)
        } else {
            Ok(None)
        }
    }

    /// All keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of facts.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no facts are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, key: &str) -> Result<&FactValue> {
        self.values.get(key).ok_or_else(|| Error::FactNotFound {
            key: key.to_string(),
        })
    }

    fn type_error(key: &str, expected: &'static str, actual: &FactValue) -> Error {
        Error::FactType {
            key: key.to_string(),
            expected,
            actual: actual.type_name(),
        }
    }
}
