//! Error types for repo-policy

/// Result type for repo-policy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by a goal handler implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while loading or applying a policy
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Policy document is not a sequence of single-key objects
    #[error("Invalid policy: {message}")]
    InvalidPolicy { message: String },

    /// Repository URL cannot be split into host/owner/name
    #[error("Invalid repository url '{url}': expected host/owner/name")]
    InvalidRepository { url: String },

    /// No registered factory handles the goal
    #[error("No handler available for goal '{goal}'")]
    UnknownGoal { goal: String },

    /// A fact was read before being set
    #[error("Fact not available: {key}")]
    FactNotFound { key: String },

    /// A fact was read as the wrong type
    #[error("Fact '{key}' has type {actual}, expected {expected}")]
    FactType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Goal payload could not be interpreted by its handler
    #[error("Invalid configuration for {kind}: {message}")]
    InvalidConfig { kind: &'static str, message: String },

    /// A handler factory failed before any goal ran
    #[error("Failed to construct handler for '{goal}': {source}")]
    Construction {
        goal: String,
        #[source]
        source: Box<Error>,
    },

    /// A goal failed; later goals in the policy were not run
    #[error("Goal '{goal}' failed: {source}")]
    GoalFailed {
        goal: String,
        #[source]
        source: Box<Error>,
    },

    /// Error raised inside a handler implementation
    #[error(transparent)]
    Handler(BoxError),

    /// A session task panicked or was cancelled
    #[error("Session for {target} did not finish: {message}")]
    TaskFailed { target: String, message: String },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Wrap any handler-side error.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }
}
