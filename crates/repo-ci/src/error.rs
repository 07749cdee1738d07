//! Error types for repo-ci

/// Result type for repo-ci operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to Travis CI
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Travis API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Neither endpoint could resolve the repository
    #[error("Failed to configure Travis client for {slug}: {reason}")]
    NotConfigured { slug: String, reason: String },
}

impl From<Error> for repo_policy::Error {
    fn from(err: Error) -> Self {
        repo_policy::Error::handler(err)
    }
}
