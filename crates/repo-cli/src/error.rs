//! Error types for repo-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from repo-policy
    #[error(transparent)]
    Policy(#[from] repo_policy::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Some targets could not be brought in line with the policy
    #[error("{failed} of {total} target(s) failed")]
    TargetsFailed { failed: usize, total: usize },
}
