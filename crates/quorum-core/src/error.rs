use crate::types::ReviewerRole;

/// Errors that can occur across the Quorum bot.
///
/// Each variant wraps a specific failure domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use quorum_core::QuorumError;
///
/// let err = QuorumError::Auth("token rejected".into());
/// assert!(err.to_string().contains("token rejected"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum QuorumError {
    /// A credential was missing or rejected by a remote API.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The repository, pull request, or another remote resource is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// GitHub API failure other than auth/not-found.
    #[error("GitHub API error: {0}")]
    Api(String),

    /// LLM session API failure.
    #[error("LLM error: {0}")]
    Llm(String),

    /// A network call exceeded its upper time bound.
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// Human-readable name of the operation that timed out.
        operation: String,
        /// The bound that was exceeded.
        secs: u64,
    },

    /// One reviewer's session failed. Recovered per-branch by the
    /// orchestrator; never aborts sibling reviewers.
    #[error("{role} reviewer failed: {message}")]
    Reviewer {
        /// The role whose session failed.
        role: ReviewerRole,
        /// What went wrong.
        message: String,
    },

    /// Every reviewer branch failed; there is nothing to merge.
    #[error("all reviewers failed, no findings to merge")]
    AllReviewersFailed,

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: QuorumError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn timeout_shows_operation_and_bound() {
        let err = QuorumError::Timeout {
            operation: "session await".into(),
            secs: 60,
        };
        assert_eq!(err.to_string(), "session await timed out after 60s");
    }

    #[test]
    fn reviewer_failure_names_the_role() {
        let err = QuorumError::Reviewer {
            role: ReviewerRole::Security,
            message: "connection reset".into(),
        };
        assert!(err.to_string().contains("security"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn all_reviewers_failed_displays_message() {
        let err = QuorumError::AllReviewersFailed;
        assert!(err.to_string().contains("all reviewers failed"));
    }
}
