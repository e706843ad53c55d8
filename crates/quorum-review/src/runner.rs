use quorum_core::{QuorumError, ReviewerRole};

use crate::prompt;
use crate::session::{SessionClient, SessionHandle, SystemMessageMode};

/// Run one reviewer session: create, send the shared prompt, tear down.
///
/// The session is destroyed on every exit path. Failures are wrapped as
/// [`QuorumError::Reviewer`] so the orchestrator can recover them per-branch
/// without aborting sibling reviewers.
///
/// # Errors
///
/// Returns [`QuorumError::Reviewer`] carrying the role and the underlying
/// cause.
pub async fn run_reviewer(
    client: &SessionClient,
    role: ReviewerRole,
    pr_prompt: &str,
) -> Result<String, QuorumError> {
    let session = client
        .create_session(prompt::role_system_prompt(role), SystemMessageMode::Replace)
        .await
        .map_err(|e| QuorumError::Reviewer {
            role,
            message: e.to_string(),
        })?;

    let result = send_then_destroy(client, session, pr_prompt).await;
    result.map_err(|e| QuorumError::Reviewer {
        role,
        message: e.to_string(),
    })
}

/// Run the single-session summary used by the simple mode.
///
/// Unlike reviewer branches this is a required path, so failures propagate
/// unwrapped and terminate the run.
///
/// # Errors
///
/// Returns the underlying [`QuorumError`] from session creation, the awaited
/// completion, or teardown.
pub async fn run_summary(client: &SessionClient, pr_prompt: &str) -> Result<String, QuorumError> {
    let session = client
        .create_session(prompt::SUMMARY_SYSTEM_PROMPT, SystemMessageMode::Replace)
        .await?;
    send_then_destroy(client, session, pr_prompt).await
}

/// Send a prompt and guarantee the session is released whether the send
/// succeeded or not. A teardown failure after a successful send is demoted to
/// a warning so the response is not lost.
async fn send_then_destroy(
    client: &SessionClient,
    session: SessionHandle,
    pr_prompt: &str,
) -> Result<String, QuorumError> {
    let outcome = client.send_and_wait(&session, pr_prompt).await;
    let teardown = client.destroy_session(session).await;

    match (outcome, teardown) {
        (Ok(text), Ok(())) => Ok(text),
        (Ok(text), Err(e)) => {
            eprintln!("warning: session teardown failed after completion: {e}");
            Ok(text)
        }
        (Err(e), _) => Err(e),
    }
}
