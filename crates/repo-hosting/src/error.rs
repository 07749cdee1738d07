//! Error types for repo-hosting

/// Result type for repo-hosting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the hosting service
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Git(#[from] repo_git::Error),
}

impl From<Error> for repo_policy::Error {
    fn from(err: Error) -> Self {
        repo_policy::Error::handler(err)
    }
}
