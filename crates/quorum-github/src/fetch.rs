use serde::Deserialize;

use quorum_core::{FileChange, FileStatus, LimitConfig, PullRequestSnapshot, QuorumError};

use crate::client::GitHubClient;

/// Appended to a patch that was cut at the per-file ceiling.
pub const TRUNCATION_MARKER: &str = "\n[... diff truncated ...]";

/// Page size for file and commit listings.
const PER_PAGE: usize = 100;

#[derive(Deserialize)]
struct PrDto {
    title: Option<String>,
    body: Option<String>,
    user: Option<UserDto>,
    base: RefDto,
    head: RefDto,
}

#[derive(Deserialize)]
struct UserDto {
    login: String,
}

#[derive(Deserialize)]
struct RefDto {
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Deserialize)]
struct FileDto {
    filename: String,
    status: String,
    additions: u64,
    deletions: u64,
    patch: Option<String>,
}

#[derive(Deserialize)]
struct CommitDto {
    commit: CommitDetailDto,
}

#[derive(Deserialize)]
struct CommitDetailDto {
    message: String,
}

impl GitHubClient {
    /// Fetch a pull request into an immutable [`PullRequestSnapshot`].
    ///
    /// Lists changed files and commits with pagination, applies the per-file
    /// patch ceiling to each file, then the aggregate ceiling across files in
    /// their original order. Files past the aggregate ceiling keep their
    /// metadata but lose patch text.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::NotFound`] when the repo or PR is absent,
    /// [`QuorumError::Auth`] when GitHub rejects the credential, and
    /// [`QuorumError::Api`] / [`QuorumError::Timeout`] on other failures.
    pub async fn fetch_snapshot(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        limits: &LimitConfig,
    ) -> Result<PullRequestSnapshot, QuorumError> {
        let pr: PrDto = self
            .get_json(
                &format!("https://api.github.com/repos/{owner}/{repo}/pulls/{number}"),
                &format!("pull request {owner}/{repo}#{number}"),
            )
            .await?;

        let mut files: Vec<FileChange> = Vec::new();
        let mut page = 1usize;
        loop {
            let url = format!(
                "https://api.github.com/repos/{owner}/{repo}/pulls/{number}/files?per_page={PER_PAGE}&page={page}"
            );
            let batch: Vec<FileDto> = self.get_json(&url, "PR file list").await?;
            let last_page = batch.len() < PER_PAGE;
            files.extend(batch.into_iter().map(|f| FileChange {
                filename: f.filename,
                status: FileStatus::from_api(&f.status),
                additions: f.additions,
                deletions: f.deletions,
                patch: f.patch.map(|p| cap_patch(&p, limits.per_file_chars)),
            }));
            if last_page {
                break;
            }
            page += 1;
        }
        let files = apply_patch_budget(files, limits.total_chars);

        let mut commit_messages: Vec<String> = Vec::new();
        let mut page = 1usize;
        loop {
            let url = format!(
                "https://api.github.com/repos/{owner}/{repo}/pulls/{number}/commits?per_page={PER_PAGE}&page={page}"
            );
            let batch: Vec<CommitDto> = self.get_json(&url, "PR commit list").await?;
            let last_page = batch.len() < PER_PAGE;
            commit_messages.extend(batch.into_iter().map(|c| c.commit.message));
            if last_page {
                break;
            }
            page += 1;
        }

        Ok(PullRequestSnapshot {
            title: pr.title.unwrap_or_default(),
            body: pr.body.unwrap_or_default(),
            author: pr.user.map(|u| u.login).unwrap_or_default(),
            base_ref: pr.base.name,
            head_ref: pr.head.name,
            commit_messages,
            files,
        })
    }
}

/// Cap one file's patch at `limit` characters, appending the truncation
/// marker when anything was cut.
///
/// The cut lands on a `char` boundary at or below `limit` bytes, so the
/// result is deterministic for identical input.
///
/// # Examples
///
/// ```
/// use quorum_github::fetch::{cap_patch, TRUNCATION_MARKER};
///
/// let patch = "x".repeat(5_000);
/// let capped = cap_patch(&patch, 3_000);
/// assert!(capped.ends_with(TRUNCATION_MARKER));
/// assert_eq!(capped.len(), 3_000 + TRUNCATION_MARKER.len());
/// ```
pub fn cap_patch(patch: &str, limit: usize) -> String {
    if patch.len() <= limit {
        return patch.to_string();
    }
    let mut end = limit;
    while !patch.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATION_MARKER}", &patch[..end])
}

/// Apply the aggregate patch budget across files in their original order.
///
/// Files are included until adding the next patch would exceed `total_chars`;
/// that file and every later file keep metadata only. Files are never dropped
/// from the list.
///
/// # Examples
///
/// ```
/// use quorum_core::{FileChange, FileStatus};
/// use quorum_github::fetch::apply_patch_budget;
///
/// let files = vec![
///     FileChange {
///         filename: "a.rs".into(),
///         status: FileStatus::Modified,
///         additions: 1,
///         deletions: 0,
///         patch: Some("x".repeat(40)),
///     },
///     FileChange {
///         filename: "b.rs".into(),
///         status: FileStatus::Modified,
///         additions: 1,
///         deletions: 0,
///         patch: Some("y".repeat(40)),
///     },
/// ];
/// let budgeted = apply_patch_budget(files, 50);
/// assert!(budgeted[0].patch.is_some());
/// assert!(budgeted[1].patch.is_none());
/// ```
pub fn apply_patch_budget(mut files: Vec<FileChange>, total_chars: usize) -> Vec<FileChange> {
    let mut used = 0usize;
    let mut exhausted = false;
    for file in &mut files {
        let Some(patch) = file.patch.as_ref() else {
            continue;
        };
        if exhausted || used + patch.len() > total_chars {
            exhausted = true;
            file.patch = None;
        } else {
            used += patch.len();
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(name: &str, patch: Option<String>) -> FileChange {
        FileChange {
            filename: name.into(),
            status: FileStatus::Modified,
            additions: 1,
            deletions: 1,
            patch,
        }
    }

    #[test]
    fn cap_patch_keeps_short_patches_untouched() {
        let patch = "@@ -1 +1 @@\n-old\n+new";
        assert_eq!(cap_patch(patch, 3_000), patch);
    }

    #[test]
    fn cap_patch_cuts_at_limit_and_appends_marker() {
        let patch = "a".repeat(5_000);
        let capped = cap_patch(&patch, 3_000);
        assert_eq!(capped.len(), 3_000 + TRUNCATION_MARKER.len());
        assert!(capped.ends_with(TRUNCATION_MARKER));
        assert!(capped.starts_with(&"a".repeat(3_000)));
    }

    #[test]
    fn cap_patch_is_deterministic() {
        let patch = "b".repeat(4_321);
        assert_eq!(cap_patch(&patch, 3_000), cap_patch(&patch, 3_000));
    }

    #[test]
    fn cap_patch_respects_char_boundaries() {
        // 2-byte chars around the cut point must not split.
        let patch = "é".repeat(2_000);
        let capped = cap_patch(&patch, 3_001);
        assert!(capped.ends_with(TRUNCATION_MARKER));
        let kept = capped.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert!(kept.len() <= 3_001);
        assert!(kept.chars().all(|c| c == 'é'));
    }

    #[test]
    fn budget_includes_files_in_order_until_ceiling() {
        let files = vec![
            change("a.rs", Some("x".repeat(100))),
            change("b.rs", Some("y".repeat(5_000))),
            change("c.rs", Some("z".repeat(10))),
        ];
        let budgeted = apply_patch_budget(files, 3_000);
        assert!(budgeted[0].patch.is_some());
        // b.rs overflows the aggregate ceiling; it and everything after it
        // become metadata-only.
        assert!(budgeted[1].patch.is_none());
        assert!(budgeted[2].patch.is_none());
        assert_eq!(budgeted.len(), 3);
    }

    #[test]
    fn budget_never_drops_file_entries() {
        let files = vec![
            change("a.rs", Some("x".repeat(60_000))),
            change("b.rs", None),
            change("c.rs", Some("z".repeat(10))),
        ];
        let budgeted = apply_patch_budget(files, 50_000);
        assert_eq!(budgeted.len(), 3);
        assert_eq!(budgeted[0].filename, "a.rs");
        assert!(budgeted[0].patch.is_none());
        assert!(budgeted[2].patch.is_none());
    }

    #[test]
    fn budget_keeps_everything_when_under_ceiling() {
        let files = vec![
            change("a.rs", Some("x".repeat(100))),
            change("b.rs", Some("y".repeat(100))),
        ];
        let budgeted = apply_patch_budget(files, 50_000);
        assert!(budgeted.iter().all(|f| f.patch.is_some()));
    }

    #[test]
    fn small_file_kept_whole_while_large_file_is_capped() {
        // Two files: first ~100 short lines, second a 5,000-char patch.
        let first: String = (0..100).map(|i| format!("+line {i}\n")).collect();
        let second = "s".repeat(5_000);

        let files = vec![
            change("first.rs", Some(cap_patch(&first, 3_000))),
            change("second.rs", Some(cap_patch(&second, 3_000))),
        ];
        let budgeted = apply_patch_budget(files, 50_000);

        // First file's patch survives whole; second is capped with a marker.
        assert_eq!(budgeted[0].patch.as_deref(), Some(first.as_str()));
        let capped = budgeted[1].patch.as_deref().unwrap();
        assert!(capped.starts_with(&"s".repeat(3_000)));
        assert!(capped.ends_with(TRUNCATION_MARKER));
    }
}
