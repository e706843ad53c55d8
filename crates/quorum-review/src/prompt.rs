use std::fmt::Write;

use quorum_core::{PullRequestSnapshot, ReviewOutcome, ReviewerRole};

/// System instruction for the single-session summary mode.
pub const SUMMARY_SYSTEM_PROMPT: &str = "\
You are a code review assistant. Given pull request metadata and diffs, write \
a concise summary for reviewers.

Rules:
- Lead with one paragraph describing the intent of the change
- List notable changes per file, grouped by area
- Call out anything risky: schema changes, auth paths, deleted tests
- Do not praise the code or speculate beyond the diff
- Plain GitHub-flavored markdown, no front matter";

/// System instruction for the orchestrator session that merges reviewer
/// findings.
pub const ORCHESTRATOR_SYSTEM_PROMPT: &str = "\
You are the review orchestrator. You receive raw findings from several \
specialist reviewers of the same pull request.

Rules:
- Deduplicate overlapping findings; keep the most specific wording
- Classify every finding as Critical, Warning, or Suggestion
- Keep a finding's filename/location tag when the reviewer provided one
- If a specialist is marked unavailable, say so in a short note
- Output three markdown sections in this order: Critical, Warning, Suggestion
- If a section has no findings, write 'None.'";

const SECURITY_SYSTEM_PROMPT: &str = "\
You are a security reviewer. Examine the pull request for vulnerabilities: \
injection, authentication and authorization gaps, secrets in code, unsafe \
deserialization, path traversal.

Rules:
- Only report issues visible in the provided diff
- Cite the filename for every finding
- If nothing is wrong, say 'no security findings' explicitly";

const PERFORMANCE_SYSTEM_PROMPT: &str = "\
You are a performance reviewer. Examine the pull request for algorithmic \
cost, needless allocations, blocking calls on hot paths, N+1 query patterns, \
and unbounded growth.

Rules:
- Only report issues visible in the provided diff
- Cite the filename for every finding
- If nothing is wrong, say 'no performance findings' explicitly";

const READABILITY_SYSTEM_PROMPT: &str = "\
You are a readability reviewer. Examine the pull request for naming, \
structure, dead code, and maintainability problems a future reader would \
stumble over.

Rules:
- Only report issues visible in the provided diff
- Cite the filename for every finding
- Do not restate style preferences the diff already follows
- If nothing is wrong, say 'no readability findings' explicitly";

/// Fixed system instruction for a reviewer role.
///
/// # Examples
///
/// ```
/// use quorum_core::ReviewerRole;
/// use quorum_review::prompt::role_system_prompt;
///
/// assert!(role_system_prompt(ReviewerRole::Security).contains("security"));
/// ```
pub fn role_system_prompt(role: ReviewerRole) -> &'static str {
    match role {
        ReviewerRole::Security => SECURITY_SYSTEM_PROMPT,
        ReviewerRole::Performance => PERFORMANCE_SYSTEM_PROMPT,
        ReviewerRole::Readability => READABILITY_SYSTEM_PROMPT,
    }
}

/// Render a snapshot into the shared prompt sent to every session.
///
/// Pure and deterministic: identical snapshots always yield identical
/// prompts. Files whose patch was dropped by the aggregate budget appear as
/// metadata-only lines.
///
/// # Examples
///
/// ```
/// use quorum_core::PullRequestSnapshot;
/// use quorum_review::prompt::build_pr_prompt;
///
/// let snapshot = PullRequestSnapshot {
///     title: "Fix pagination".into(),
///     body: String::new(),
///     author: "octocat".into(),
///     base_ref: "main".into(),
///     head_ref: "fix/pages".into(),
///     commit_messages: vec![],
///     files: vec![],
/// };
/// let prompt = build_pr_prompt(&snapshot);
/// assert!(prompt.contains("Fix pagination"));
/// assert!(prompt.contains("main <- fix/pages"));
/// ```
pub fn build_pr_prompt(snapshot: &PullRequestSnapshot) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "# Pull Request: {}", snapshot.title);
    let _ = writeln!(prompt, "Author: {}", snapshot.author);
    let _ = writeln!(
        prompt,
        "Branches: {} <- {}",
        snapshot.base_ref, snapshot.head_ref
    );

    if !snapshot.body.is_empty() {
        let _ = writeln!(prompt, "\n## Description\n{}", snapshot.body);
    }

    if !snapshot.commit_messages.is_empty() {
        prompt.push_str("\n## Commits\n");
        for message in &snapshot.commit_messages {
            // First line only; bodies can be arbitrarily long.
            let subject = message.lines().next().unwrap_or_default();
            let _ = writeln!(prompt, "- {subject}");
        }
    }

    prompt.push_str("\n## Changed files\n");
    for file in &snapshot.files {
        let _ = writeln!(
            prompt,
            "\n### {} ({}, +{} -{})",
            file.filename, file.status, file.additions, file.deletions
        );
        match &file.patch {
            Some(patch) => {
                let _ = writeln!(prompt, "```diff\n{patch}\n```");
            }
            None => prompt.push_str("(diff omitted)\n"),
        }
    }

    prompt
}

/// Build the merge prompt handed to the orchestrator session.
///
/// Outcomes are presented in the fixed role order regardless of the order
/// they are passed in, so merge input is reproducible across runs. Failed
/// roles are noted as unavailable, never silently omitted.
///
/// # Examples
///
/// ```
/// use quorum_core::{ReviewOutcome, ReviewerRole};
/// use quorum_review::prompt::build_merge_prompt;
///
/// let outcomes = vec![
///     ReviewOutcome::failed(ReviewerRole::Readability, "timed out".into()),
///     ReviewOutcome::succeeded(ReviewerRole::Security, "no findings".into()),
/// ];
/// let prompt = build_merge_prompt(&outcomes);
/// let security = prompt.find("Security reviewer").unwrap();
/// let readability = prompt.find("Readability reviewer").unwrap();
/// assert!(security < readability);
/// assert!(prompt.contains("unavailable"));
/// ```
pub fn build_merge_prompt(outcomes: &[ReviewOutcome]) -> String {
    let mut ordered: Vec<&ReviewOutcome> = outcomes.iter().collect();
    ordered.sort_by_key(|o| o.role.rank());

    let mut prompt = String::from(
        "Merge the following specialist review findings into one report.\n",
    );
    for outcome in ordered {
        let label = outcome.role.label();
        match &outcome.output {
            Some(text) => {
                let _ = writeln!(prompt, "\n## {label} reviewer\n{text}");
            }
            None => {
                let reason = outcome.failure.as_deref().unwrap_or("unknown failure");
                let _ = writeln!(prompt, "\n## {label} reviewer\n(unavailable: {reason})");
            }
        }
    }
    prompt
}
