use std::time::Duration;

use serde::de::DeserializeOwned;

use quorum_core::QuorumError;

/// Upper bound for a single GitHub API call.
const API_TIMEOUT_SECS: u64 = 30;

/// GitHub client for fetching pull-request data and publishing comments.
///
/// Reads go through a plain `reqwest` client with typed DTOs; mutations go
/// through `octocrab`'s generic routes.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
}

impl GitHubClient {
    /// Create a client from an explicit token or the `GITHUB_TOKEN` /
    /// `GH_TOKEN` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Auth`] if no token is available, or
    /// [`QuorumError::Api`] if the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quorum_github::GitHubClient;
    ///
    /// let client = GitHubClient::new(Some("ghp_xxxx")).unwrap();
    /// ```
    pub fn new(token: Option<&str>) -> Result<Self, QuorumError> {
        let token = match token {
            Some(t) => t.to_string(),
            None => std::env::var("GITHUB_TOKEN")
                .or_else(|_| std::env::var("GH_TOKEN"))
                .map_err(|_| {
                    QuorumError::Auth(
                        "GITHUB_TOKEN not set. Set GITHUB_TOKEN or GH_TOKEN, or put a token \
                         in .quorum.toml under [github]"
                            .into(),
                    )
                })?,
        };

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.clone())
            .build()
            .map_err(|e| QuorumError::Api(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .build()
            .map_err(|e| QuorumError::Api(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            octocrab,
            http,
            token,
        })
    }

    /// GET a GitHub REST endpoint and deserialize the JSON response.
    ///
    /// `what` names the resource in error messages: 401/403 becomes
    /// [`QuorumError::Auth`], 404 becomes [`QuorumError::NotFound`], and any
    /// other non-success status becomes [`QuorumError::Api`].
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T, QuorumError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "quorum")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QuorumError::Timeout {
                        operation: format!("fetching {what}"),
                        secs: API_TIMEOUT_SECS,
                    }
                } else {
                    QuorumError::Api(format!("failed to fetch {what}: {e}"))
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            401 | 403 => {
                return Err(QuorumError::Auth(format!(
                    "GitHub rejected credentials while fetching {what}"
                )))
            }
            404 => return Err(QuorumError::NotFound(what.to_string())),
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(QuorumError::Api(format!(
                    "GitHub API error {status} while fetching {what}: {body}"
                )));
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| QuorumError::Api(format!("failed to parse {what} response: {e}")))
    }

    pub(crate) fn octocrab(&self) -> &octocrab::Octocrab {
        &self.octocrab
    }
}

/// Convert an octocrab mutation error into the Quorum taxonomy.
pub(crate) fn map_octocrab_error(e: octocrab::Error, what: &str) -> QuorumError {
    if let octocrab::Error::GitHub { source, .. } = &e {
        match source.status_code.as_u16() {
            401 | 403 => {
                return QuorumError::Auth(format!("GitHub rejected credentials while {what}"))
            }
            404 => return QuorumError::NotFound(what.to_string()),
            _ => {}
        }
    }
    QuorumError::Api(format!("failed while {what}: {e}"))
}
