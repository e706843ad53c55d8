use std::time::Duration;

use serde::{Deserialize, Serialize};

use quorum_core::{LlmConfig, QuorumError};

const DEFAULT_BASE_URL: &str = "https://api.githubcopilot.com";

/// How the system message interacts with the provider's built-in instructions.
///
/// # Examples
///
/// ```
/// use quorum_review::SystemMessageMode;
///
/// let json = serde_json::to_string(&SystemMessageMode::Replace).unwrap();
/// assert_eq!(json, "\"replace\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemMessageMode {
    /// The system message fully replaces the provider default.
    Replace,
    /// The system message is appended to the provider default.
    Augment,
}

/// Opaque handle to one live session on the LLM service.
///
/// Obtained from [`SessionClient::create_session`] and consumed by
/// [`SessionClient::destroy_session`].
#[derive(Debug)]
pub struct SessionHandle {
    id: String,
}

#[derive(Deserialize)]
struct SessionDto {
    id: String,
}

#[derive(Deserialize)]
struct MessageDto {
    data: MessageDataDto,
}

#[derive(Deserialize)]
struct MessageDataDto {
    content: String,
}

/// Client for the hosted LLM session API.
///
/// One client is shared read-only across concurrently dispatched reviewer
/// units; each unit creates its own independent session. Cloning is cheap
/// (the underlying HTTP client is reference-counted).
///
/// # Examples
///
/// ```
/// use quorum_core::LlmConfig;
/// use quorum_review::SessionClient;
///
/// let client = SessionClient::new(&LlmConfig::default(), "token".into()).unwrap();
/// assert_eq!(client.model(), "gpt-4.1");
/// ```
#[derive(Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    model: String,
    timeout: Duration,
}

impl SessionClient {
    /// Create a new session client from configuration and a resolved
    /// credential.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig, token: String) -> Result<Self, QuorumError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuorumError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token,
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Return the model identifier sessions are created with.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Open a session with a fixed system instruction and built-in tools
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Auth`] when the credential is rejected,
    /// [`QuorumError::Timeout`] when session creation exceeds the bound, and
    /// [`QuorumError::Llm`] on other failures.
    pub async fn create_session(
        &self,
        system: &str,
        mode: SystemMessageMode,
    ) -> Result<SessionHandle, QuorumError> {
        let url = format!("{}/v1/sessions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "system": { "mode": mode, "content": system },
            "tools": [],
        });

        let session: SessionDto = self
            .request_json(self.http.post(&url).json(&body), "session creation")
            .await?;
        Ok(SessionHandle { id: session.id })
    }

    /// Send a prompt to a session and await the completed response, bounded
    /// by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Timeout`] when the bound is exceeded, and
    /// [`QuorumError::Llm`] on transport or response-shape failures.
    pub async fn send_and_wait(
        &self,
        session: &SessionHandle,
        prompt: &str,
    ) -> Result<String, QuorumError> {
        let url = format!("{}/v1/sessions/{}/messages", self.base_url, session.id);
        let body = serde_json::json!({ "prompt": prompt });

        let request = self.http.post(&url).json(&body);
        let message: MessageDto = tokio::time::timeout(
            self.timeout,
            self.request_json(request, "session await"),
        )
        .await
        .map_err(|_| QuorumError::Timeout {
            operation: "session await".into(),
            secs: self.timeout.as_secs(),
        })??;

        Ok(message.data.content)
    }

    /// Tear down a session, releasing the server-side resource.
    ///
    /// Consumes the handle; callers must invoke this on every exit path,
    /// success or failure.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Llm`] if the delete call fails.
    pub async fn destroy_session(&self, session: SessionHandle) -> Result<(), QuorumError> {
        let url = format!("{}/v1/sessions/{}", self.base_url, session.id);
        let response = self
            .http
            .delete(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| QuorumError::Llm(format!("session teardown failed: {e}")))?;
        if !response.status().is_success() {
            return Err(QuorumError::Llm(format!(
                "session teardown failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, QuorumError> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QuorumError::Timeout {
                        operation: what.into(),
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    QuorumError::Llm(format!("{what} failed: {e}"))
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(QuorumError::Auth(format!(
                "LLM service rejected credentials during {what}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuorumError::Llm(format!(
                "{what} failed with status {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| QuorumError::Llm(format!("failed to parse {what} response: {e}")))
    }
}
