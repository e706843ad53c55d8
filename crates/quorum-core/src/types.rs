use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable record of everything the bot needs to know about a pull request.
///
/// Built once per invocation from the GitHub API and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use quorum_core::PullRequestSnapshot;
///
/// let snapshot = PullRequestSnapshot {
///     title: "Add retry logic".into(),
///     body: String::new(),
///     author: "octocat".into(),
///     base_ref: "main".into(),
///     head_ref: "feature/retry".into(),
///     commit_messages: vec!["add retry".into()],
///     files: vec![],
/// };
/// assert_eq!(snapshot.author, "octocat");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestSnapshot {
    /// PR title.
    pub title: String,
    /// PR description body; empty when the author wrote none.
    pub body: String,
    /// Author's login handle.
    pub author: String,
    /// Name of the branch the PR merges into.
    pub base_ref: String,
    /// Name of the branch the PR comes from.
    pub head_ref: String,
    /// Commit messages in the order GitHub reports them.
    pub commit_messages: Vec<String>,
    /// Changed files in the order GitHub reports them.
    pub files: Vec<FileChange>,
}

/// One changed file in a pull request.
///
/// `patch` is `None` either when GitHub omits the diff (binary files) or when
/// the aggregate diff budget dropped it; the metadata fields are always kept.
///
/// # Examples
///
/// ```
/// use quorum_core::{FileChange, FileStatus};
///
/// let change = FileChange {
///     filename: "src/lib.rs".into(),
///     status: FileStatus::Modified,
///     additions: 12,
///     deletions: 3,
///     patch: Some("@@ -1 +1 @@".into()),
/// };
/// assert_eq!(change.additions, 12);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// What happened to the file.
    pub status: FileStatus,
    /// Added line count.
    pub additions: u64,
    /// Deleted line count.
    pub deletions: u64,
    /// Unified diff text, possibly truncated with a trailing marker.
    pub patch: Option<String>,
}

/// Classification of a file change.
///
/// # Examples
///
/// ```
/// use quorum_core::FileStatus;
///
/// assert_eq!(FileStatus::from_api("renamed"), FileStatus::Renamed);
/// assert_eq!(format!("{}", FileStatus::Added), "added");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// New file.
    Added,
    /// Existing file changed in place.
    Modified,
    /// File deleted.
    Removed,
    /// File moved or renamed.
    Renamed,
}

impl FileStatus {
    /// Map a GitHub API status string onto the closed status set.
    ///
    /// GitHub also reports `copied`/`changed`/`unchanged`; those collapse to
    /// [`FileStatus::Modified`].
    pub fn from_api(status: &str) -> Self {
        match status {
            "added" => FileStatus::Added,
            "removed" => FileStatus::Removed,
            "renamed" => FileStatus::Renamed,
            _ => FileStatus::Modified,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Renamed => write!(f, "renamed"),
        }
    }
}

/// Specialized reviewer roles dispatched by the orchestrator.
///
/// [`ReviewerRole::ALL`] defines the fixed presentation order used everywhere
/// a reviewer's output is shown: dispatch, merge prompt, final report.
///
/// # Examples
///
/// ```
/// use quorum_core::ReviewerRole;
///
/// assert_eq!(ReviewerRole::ALL.len(), 3);
/// assert_eq!(format!("{}", ReviewerRole::Security), "security");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerRole {
    /// Vulnerabilities, injection, secrets, unsafe patterns.
    Security,
    /// Algorithmic cost, allocations, blocking calls.
    Performance,
    /// Naming, structure, maintainability.
    Readability,
}

impl ReviewerRole {
    /// Every role, in the stable presentation order.
    pub const ALL: [ReviewerRole; 3] = [
        ReviewerRole::Security,
        ReviewerRole::Performance,
        ReviewerRole::Readability,
    ];

    /// Human-readable label used in prompts and reports.
    pub fn label(self) -> &'static str {
        match self {
            ReviewerRole::Security => "Security",
            ReviewerRole::Performance => "Performance",
            ReviewerRole::Readability => "Readability",
        }
    }

    /// Position of this role in [`ReviewerRole::ALL`].
    pub fn rank(self) -> usize {
        Self::ALL.iter().position(|r| *r == self).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for ReviewerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewerRole::Security => write!(f, "security"),
            ReviewerRole::Performance => write!(f, "performance"),
            ReviewerRole::Readability => write!(f, "readability"),
        }
    }
}

/// Terminal state of one reviewer branch after fan-out.
///
/// Exactly one of `output` / `failure` is set. Failures are carried forward so
/// the merged report can name unavailable reviews instead of dropping them.
///
/// # Examples
///
/// ```
/// use quorum_core::{ReviewOutcome, ReviewerRole};
///
/// let ok = ReviewOutcome::succeeded(ReviewerRole::Security, "no issues".into());
/// assert!(ok.is_success());
///
/// let bad = ReviewOutcome::failed(ReviewerRole::Performance, "timed out".into());
/// assert!(!bad.is_success());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// Which reviewer this outcome belongs to.
    pub role: ReviewerRole,
    /// Raw response text when the session completed.
    pub output: Option<String>,
    /// Failure description when the session did not complete.
    pub failure: Option<String>,
}

impl ReviewOutcome {
    /// Build a successful outcome.
    pub fn succeeded(role: ReviewerRole, output: String) -> Self {
        Self {
            role,
            output: Some(output),
            failure: None,
        }
    }

    /// Build a failed outcome.
    pub fn failed(role: ReviewerRole, failure: String) -> Self {
        Self {
            role,
            output: None,
            failure: Some(failure),
        }
    }

    /// Whether the reviewer produced output.
    pub fn is_success(&self) -> bool {
        self.output.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_status_from_api_maps_known_values() {
        assert_eq!(FileStatus::from_api("added"), FileStatus::Added);
        assert_eq!(FileStatus::from_api("modified"), FileStatus::Modified);
        assert_eq!(FileStatus::from_api("removed"), FileStatus::Removed);
        assert_eq!(FileStatus::from_api("renamed"), FileStatus::Renamed);
    }

    #[test]
    fn file_status_from_api_collapses_unknown_values() {
        assert_eq!(FileStatus::from_api("copied"), FileStatus::Modified);
        assert_eq!(FileStatus::from_api("changed"), FileStatus::Modified);
        assert_eq!(FileStatus::from_api(""), FileStatus::Modified);
    }

    #[test]
    fn role_order_is_stable() {
        assert_eq!(ReviewerRole::Security.rank(), 0);
        assert_eq!(ReviewerRole::Performance.rank(), 1);
        assert_eq!(ReviewerRole::Readability.rank(), 2);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ReviewerRole::Readability).unwrap();
        assert_eq!(json, "\"readability\"");
    }

    #[test]
    fn outcome_constructors_set_exactly_one_side() {
        let ok = ReviewOutcome::succeeded(ReviewerRole::Security, "fine".into());
        assert!(ok.output.is_some());
        assert!(ok.failure.is_none());

        let bad = ReviewOutcome::failed(ReviewerRole::Security, "boom".into());
        assert!(bad.output.is_none());
        assert!(bad.failure.is_some());
    }
}
