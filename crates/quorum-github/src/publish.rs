use serde::Deserialize;

use quorum_core::QuorumError;

use crate::client::{map_octocrab_error, GitHubClient};

/// Sentinel at the very start of every comment the bot owns. Renders
/// invisibly; detection is a prefix match on the stored comment body.
pub const COMMENT_MARKER: &str = "<!-- quorum-bot-report -->";

/// Fixed header shown under the marker.
pub const COMMENT_HEADER: &str = "## Quorum Review";

/// Page size for comment listings.
const PER_PAGE: usize = 100;

/// What the upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    /// A new marker comment was created.
    Created,
    /// The existing marker comment was edited in place.
    Updated,
}

#[derive(Deserialize)]
struct CommentDto {
    id: u64,
    body: Option<String>,
}

impl GitHubClient {
    /// Publish `body` as the bot's single marker-tagged comment on a PR.
    ///
    /// Scans existing issue comments for one whose body starts with
    /// [`COMMENT_MARKER`] and edits it in place; otherwise creates a new
    /// comment. Re-running with identical input leaves exactly one marker
    /// comment whose content equals the latest body.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Auth`] / [`QuorumError::NotFound`] /
    /// [`QuorumError::Api`] analogous to the fetch operations.
    pub async fn upsert_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<CommentAction, QuorumError> {
        let rendered = render_comment(body);

        let mut existing: Option<u64> = None;
        let mut page = 1usize;
        loop {
            let url = format!(
                "https://api.github.com/repos/{owner}/{repo}/issues/{number}/comments?per_page={PER_PAGE}&page={page}"
            );
            let batch: Vec<CommentDto> = self.get_json(&url, "PR comment list").await?;
            let last_page = batch.len() < PER_PAGE;
            let bodies: Vec<(u64, String)> = batch
                .into_iter()
                .map(|c| (c.id, c.body.unwrap_or_default()))
                .collect();
            if let Some(id) = find_marker_comment(&bodies) {
                existing = Some(id);
                break;
            }
            if last_page {
                break;
            }
            page += 1;
        }

        let payload = serde_json::json!({ "body": rendered });
        match existing {
            Some(id) => {
                let route = format!("/repos/{owner}/{repo}/issues/comments/{id}");
                let _response: serde_json::Value = self
                    .octocrab()
                    .patch(route, Some(&payload))
                    .await
                    .map_err(|e| map_octocrab_error(e, "updating the PR comment"))?;
                Ok(CommentAction::Updated)
            }
            None => {
                let route = format!("/repos/{owner}/{repo}/issues/{number}/comments");
                let _response: serde_json::Value = self
                    .octocrab()
                    .post(route, Some(&payload))
                    .await
                    .map_err(|e| map_octocrab_error(e, "creating the PR comment"))?;
                Ok(CommentAction::Created)
            }
        }
    }
}

/// Prepend the marker and fixed header to a report body.
///
/// # Examples
///
/// ```
/// use quorum_github::publish::{render_comment, COMMENT_MARKER};
///
/// let rendered = render_comment("All good.");
/// assert!(rendered.starts_with(COMMENT_MARKER));
/// assert!(rendered.ends_with("All good."));
/// ```
pub fn render_comment(body: &str) -> String {
    format!("{COMMENT_MARKER}\n{COMMENT_HEADER}\n\n{body}")
}

/// Find the first comment whose body starts with the marker.
///
/// # Examples
///
/// ```
/// use quorum_github::publish::{find_marker_comment, COMMENT_MARKER};
///
/// let comments = vec![
///     (1, "unrelated".to_string()),
///     (2, format!("{COMMENT_MARKER}\nolder report")),
/// ];
/// assert_eq!(find_marker_comment(&comments), Some(2));
/// ```
pub fn find_marker_comment(comments: &[(u64, String)]) -> Option<u64> {
    comments
        .iter()
        .find(|(_, body)| body.starts_with(COMMENT_MARKER))
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_comment_starts_with_marker_then_header() {
        let rendered = render_comment("report text");
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some(COMMENT_MARKER));
        assert_eq!(lines.next(), Some(COMMENT_HEADER));
        assert!(rendered.ends_with("report text"));
    }

    #[test]
    fn find_marker_comment_ignores_unrelated_comments() {
        let comments = vec![
            (10, "looks good to me".to_string()),
            (11, "another human comment".to_string()),
        ];
        assert_eq!(find_marker_comment(&comments), None);
    }

    #[test]
    fn find_marker_comment_requires_prefix_not_substring() {
        let comments = vec![(5, format!("quoted: {COMMENT_MARKER}"))];
        assert_eq!(find_marker_comment(&comments), None);
    }

    #[test]
    fn find_marker_comment_returns_first_match() {
        let comments = vec![
            (1, "human".to_string()),
            (2, render_comment("first report")),
            (3, render_comment("stray duplicate")),
        ];
        assert_eq!(find_marker_comment(&comments), Some(2));
    }

    #[test]
    fn upsert_decision_is_idempotent_on_rendered_output() {
        // Simulate publishing twice: the second run finds the first run's
        // comment and targets it instead of creating a duplicate.
        let after_first = vec![(42, render_comment("v1"))];
        assert_eq!(find_marker_comment(&after_first), Some(42));

        let after_second = vec![(42, render_comment("v2"))];
        assert_eq!(find_marker_comment(&after_second), Some(42));
        assert!(after_second[0].1.ends_with("v2"));
    }
}
