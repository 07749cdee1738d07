//! Target repositories
//!
//! A target is identified by a canonical `host/owner/name` URL, split once
//! when the target list is loaded.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::load_document;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct RepositoryRecord {
    url: String,
}

/// A repository a policy is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RepositoryRecord")]
pub struct Repository {
    url: String,
    #[serde(skip)]
    host: String,
    #[serde(skip)]
    owner: String,
    #[serde(skip)]
    name: String,
}

impl Repository {
    /// Parse a `host/owner/name` URL.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRepository` unless the URL has exactly three non-empty
    /// `/`-separated components.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || Error::InvalidRepository {
            url: url.to_string(),
        };

        let parts: Vec<&str> = url.split('/').collect();
        let [host, owner, name] = parts.as_slice() else {
            return Err(invalid());
        };
        if host.is_empty() || owner.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            url: url.to_string(),
            host: host.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// The canonical URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hosting service, e.g. `github.com`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Owning user or organisation.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TryFrom<RepositoryRecord> for Repository {
    type Error = Error;

    fn try_from(record: RepositoryRecord) -> Result<Self> {
        Self::parse(&record.url)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Load a list of `{ "url": "host/owner/name" }` records.
pub fn load_repositories(path: &Path) -> Result<Vec<Repository>> {
    load_document(path)
}
