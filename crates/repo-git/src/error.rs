//! Error types for repo-git

/// Result type for repo-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repo-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Invalid object id '{value}'")]
    InvalidSha { value: String },

    #[error("Invalid file mode '{mode}' for {path}")]
    InvalidMode { path: String, mode: String },

    #[error("Tree entry '{path}' is not valid UTF-8")]
    NonUtf8Path { path: String },

    #[error("Reference '{name}' not found")]
    RefNotFound { name: String },

    #[error("Refusing to move '{name}' from {from} to {to}: not a descendant")]
    NotFastForward { name: String, from: String, to: String },

    #[error("Path '{path}' is used both as a file and as a directory")]
    PathConflict { path: String },

    #[error("Tree listing for {sha} was truncated")]
    TruncatedTree { sha: String },

    /// Failure reported by a remote store implementation
    #[error("Store error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an error raised by a [`GitDataStore`](crate::GitDataStore) backend.
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}
