use std::fmt;

use serde::Serialize;

use quorum_core::{ReviewOutcome, ReviewerRole};

/// The orchestrator's merged report, ready to publish.
///
/// Carries the merged body plus which reviewer roles contributed and which
/// were unavailable, so recovered failures stay visible in the final output.
///
/// # Examples
///
/// ```
/// use quorum_core::{ReviewOutcome, ReviewerRole};
/// use quorum_review::AggregatedReport;
///
/// let outcomes = vec![
///     ReviewOutcome::succeeded(ReviewerRole::Security, "findings".into()),
///     ReviewOutcome::failed(ReviewerRole::Performance, "timed out".into()),
/// ];
/// let report = AggregatedReport::new("### Critical\nNone.".into(), &outcomes);
/// assert_eq!(report.succeeded, vec![ReviewerRole::Security]);
/// assert!(report.to_markdown().contains("unavailable"));
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedReport {
    /// Merged report text from the orchestrator session.
    pub body: String,
    /// Roles whose review made it into the merge.
    pub succeeded: Vec<ReviewerRole>,
    /// Roles whose review was unavailable.
    pub failed: Vec<ReviewerRole>,
}

impl AggregatedReport {
    /// Build a report from the orchestrator's text and the collected
    /// outcomes.
    pub fn new(body: String, outcomes: &[ReviewOutcome]) -> Self {
        let succeeded = outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.role)
            .collect();
        let failed = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.role)
            .collect();
        Self {
            body,
            succeeded,
            failed,
        }
    }

    /// Render the report for publishing.
    ///
    /// Appends a footer naming the contributing reviewers and an explicit
    /// note for every unavailable one.
    pub fn to_markdown(&self) -> String {
        let mut out = self.body.clone();
        out.push_str("\n\n---\n");

        if !self.succeeded.is_empty() {
            let labels: Vec<&str> = self.succeeded.iter().map(|r| r.label()).collect();
            out.push_str(&format!("Reviewed by: {}\n", labels.join(", ")));
        }
        for role in &self.failed {
            out.push_str(&format!("_{} review unavailable._\n", role.label()));
        }
        out
    }
}

impl fmt::Display for AggregatedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_markdown())
    }
}
