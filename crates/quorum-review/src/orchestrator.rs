use std::future::Future;

use quorum_core::{QuorumError, ReviewOutcome, ReviewerRole};

use crate::prompt;
use crate::report::AggregatedReport;
use crate::runner;
use crate::session::{SessionClient, SystemMessageMode};

/// Fan out every reviewer role concurrently and collect all terminal states.
///
/// One branch failing never cancels its siblings; each branch ends as a
/// [`ReviewOutcome`]. Results come back in the fixed role order regardless of
/// completion order. Generic over the per-role future so the fan-in logic is
/// testable without a live session service.
pub async fn dispatch_reviewers<F, Fut>(run: F) -> Vec<ReviewOutcome>
where
    F: Fn(ReviewerRole) -> Fut,
    Fut: Future<Output = Result<String, QuorumError>> + Send + 'static,
{
    let handles: Vec<_> = ReviewerRole::ALL
        .into_iter()
        .map(|role| (role, tokio::spawn(run(role))))
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (role, handle) in handles {
        let outcome = match handle.await {
            Ok(Ok(text)) => ReviewOutcome::succeeded(role, text),
            Ok(Err(e)) => ReviewOutcome::failed(role, e.to_string()),
            Err(e) => ReviewOutcome::failed(role, format!("reviewer task aborted: {e}")),
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// Run the full multi-agent review: fan-out, collect, merge.
///
/// # Errors
///
/// Returns [`QuorumError::AllReviewersFailed`] when no branch succeeded, or
/// the merge session's error when the orchestrator call itself fails.
pub async fn run_review(
    client: &SessionClient,
    pr_prompt: &str,
) -> Result<AggregatedReport, QuorumError> {
    let shared = client.clone();
    let prompt_text = pr_prompt.to_string();
    let outcomes = dispatch_reviewers(move |role| {
        let client = shared.clone();
        let prompt_text = prompt_text.clone();
        async move { runner::run_reviewer(&client, role, &prompt_text).await }
    })
    .await;

    merge_outcomes(client, &outcomes).await
}

/// Merge collected outcomes through one orchestrator session.
///
/// # Errors
///
/// Returns [`QuorumError::AllReviewersFailed`] when every branch failed; the
/// merge session is never opened in that case.
pub async fn merge_outcomes(
    client: &SessionClient,
    outcomes: &[ReviewOutcome],
) -> Result<AggregatedReport, QuorumError> {
    if !outcomes.iter().any(ReviewOutcome::is_success) {
        return Err(QuorumError::AllReviewersFailed);
    }

    let merge_prompt = prompt::build_merge_prompt(outcomes);
    let session = client
        .create_session(prompt::ORCHESTRATOR_SYSTEM_PROMPT, SystemMessageMode::Replace)
        .await?;
    let result = client.send_and_wait(&session, &merge_prompt).await;
    if let Err(e) = client.destroy_session(session).await {
        eprintln!("warning: orchestrator session teardown failed: {e}");
    }

    Ok(AggregatedReport::new(result?, outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_collects_all_successes_in_role_order() {
        let outcomes = dispatch_reviewers(|role| async move {
            Ok(format!("{role} findings"))
        })
        .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].role, ReviewerRole::Security);
        assert_eq!(outcomes[1].role, ReviewerRole::Performance);
        assert_eq!(outcomes[2].role, ReviewerRole::Readability);
        assert!(outcomes.iter().all(ReviewOutcome::is_success));
    }

    #[tokio::test]
    async fn one_failing_branch_does_not_abort_siblings() {
        let outcomes = dispatch_reviewers(|role| async move {
            if role == ReviewerRole::Performance {
                Err(QuorumError::Timeout {
                    operation: "session await".into(),
                    secs: 1,
                })
            } else {
                Ok("ok".into())
            }
        })
        .await;

        let successes: Vec<_> = outcomes.iter().filter(|o| o.is_success()).collect();
        assert_eq!(successes.len(), 2);
        let failed = outcomes
            .iter()
            .find(|o| !o.is_success())
            .expect("one branch failed");
        assert_eq!(failed.role, ReviewerRole::Performance);
        assert!(failed.failure.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn slow_branches_are_awaited_not_cancelled() {
        let outcomes = dispatch_reviewers(|role| async move {
            if role == ReviewerRole::Readability {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            Ok("done".into())
        })
        .await;

        assert!(outcomes.iter().all(ReviewOutcome::is_success));
        // Collection order stays fixed even though completion order differed.
        assert_eq!(outcomes[2].role, ReviewerRole::Readability);
    }

    #[tokio::test]
    async fn merge_rejects_when_every_branch_failed() {
        let outcomes: Vec<ReviewOutcome> = ReviewerRole::ALL
            .into_iter()
            .map(|role| ReviewOutcome::failed(role, "boom".into()))
            .collect();

        // The session client is never contacted on this path; an unroutable
        // base URL proves it.
        let config = quorum_core::LlmConfig {
            base_url: Some("http://127.0.0.1:1".into()),
            ..quorum_core::LlmConfig::default()
        };
        let client = SessionClient::new(&config, "t".into()).unwrap();
        let result = merge_outcomes(&client, &outcomes).await;
        assert!(matches!(result, Err(QuorumError::AllReviewersFailed)));
    }
}
