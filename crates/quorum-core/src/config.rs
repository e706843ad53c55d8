use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::QuorumError;

/// Top-level configuration loaded from `.quorum.toml`.
///
/// Supports layered resolution: env vars > local config > defaults. The
/// binary loads the file (when present) and then calls
/// [`QuorumConfig::apply_env`] so environment values win.
///
/// # Examples
///
/// ```
/// use quorum_core::QuorumConfig;
///
/// let config = QuorumConfig::default();
/// assert_eq!(config.limits.per_file_chars, 3_000);
/// assert_eq!(config.limits.total_chars, 50_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// GitHub target and credential settings.
    #[serde(default)]
    pub github: GithubConfig,
    /// LLM session API settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Diff truncation ceilings.
    #[serde(default)]
    pub limits: LimitConfig,
}

impl QuorumConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Io`] if the file cannot be read, or
    /// [`QuorumError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quorum_core::QuorumConfig;
    /// use std::path::Path;
    ///
    /// let config = QuorumConfig::from_file(Path::new(".quorum.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, QuorumError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use quorum_core::QuorumConfig;
    ///
    /// let toml = r#"
    /// [limits]
    /// per_file_chars = 2000
    /// "#;
    /// let config = QuorumConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.limits.per_file_chars, 2000);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, QuorumError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay environment variables onto the loaded configuration.
    ///
    /// Recognized: `QUORUM_REPO` / `GITHUB_REPOSITORY`, `QUORUM_PR` /
    /// `PR_NUMBER`, `GITHUB_TOKEN` / `GH_TOKEN`, `COPILOT_API_KEY`,
    /// `QUORUM_LLM_BASE_URL`. Environment values override file values.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(repo) = get("QUORUM_REPO").or_else(|| get("GITHUB_REPOSITORY")) {
            self.github.repo = Some(repo);
        }
        if let Some(pr) = get("QUORUM_PR").or_else(|| get("PR_NUMBER")) {
            if let Ok(number) = pr.trim().parse() {
                self.github.pr = Some(number);
            }
        }
        if let Some(token) = get("GITHUB_TOKEN").or_else(|| get("GH_TOKEN")) {
            self.github.token = Some(token);
        }
        if let Some(key) = get("COPILOT_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("QUORUM_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
    }

    /// Resolve the target repository and PR number.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Config`] if either is missing or the repository
    /// identifier is not `owner/repo`.
    ///
    /// # Examples
    ///
    /// ```
    /// use quorum_core::QuorumConfig;
    ///
    /// let mut config = QuorumConfig::default();
    /// config.github.repo = Some("octocat/hello-world".into());
    /// config.github.pr = Some(42);
    /// let (owner, repo, number) = config.target().unwrap();
    /// assert_eq!(owner, "octocat");
    /// assert_eq!(repo, "hello-world");
    /// assert_eq!(number, 42);
    /// ```
    pub fn target(&self) -> Result<(String, String, u64), QuorumError> {
        let repo_id = self.github.repo.as_deref().ok_or_else(|| {
            QuorumError::Config(
                "no repository configured. Set QUORUM_REPO or GITHUB_REPOSITORY".into(),
            )
        })?;
        let Some((owner, repo)) = repo_id.split_once('/') else {
            return Err(QuorumError::Config(format!(
                "invalid repository '{repo_id}', expected owner/repo"
            )));
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(QuorumError::Config(format!(
                "invalid repository '{repo_id}', expected owner/repo"
            )));
        }
        let number = self.github.pr.ok_or_else(|| {
            QuorumError::Config("no PR number configured. Set QUORUM_PR or PR_NUMBER".into())
        })?;
        Ok((owner.to_string(), repo.to_string(), number))
    }

    /// Resolve the LLM session API credential.
    ///
    /// Priority order: explicit config value > `COPILOT_API_KEY` >
    /// `GITHUB_TOKEN` / `GH_TOKEN` > cached CLI credential at
    /// `~/.config/quorum/token`.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Auth`] if no credential is available anywhere.
    pub fn llm_credential(&self) -> Result<String, QuorumError> {
        self.llm_credential_from(|key| std::env::var(key).ok(), read_cached_token())
    }

    fn llm_credential_from(
        &self,
        get: impl Fn(&str) -> Option<String>,
        cached: Option<String>,
    ) -> Result<String, QuorumError> {
        if let Some(key) = &self.llm.api_key {
            return Ok(key.clone());
        }
        if let Some(key) = get("COPILOT_API_KEY") {
            return Ok(key);
        }
        if let Some(token) = get("GITHUB_TOKEN").or_else(|| get("GH_TOKEN")) {
            return Ok(token);
        }
        if let Some(token) = cached {
            return Ok(token);
        }
        Err(QuorumError::Auth(
            "no LLM credential found. Set COPILOT_API_KEY, GITHUB_TOKEN, \
             or log in with the CLI to cache a token"
                .into(),
        ))
    }
}

/// Read the token the CLI caches under the user config directory.
fn read_cached_token() -> Option<String> {
    let path = dirs::config_dir()?.join("quorum").join("token");
    let content = std::fs::read_to_string(path).ok()?;
    let token = content.trim().to_string();
    (!token.is_empty()).then_some(token)
}

/// GitHub target and credential settings.
///
/// # Examples
///
/// ```
/// use quorum_core::GithubConfig;
///
/// let config = GithubConfig::default();
/// assert!(config.repo.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Repository identifier, `owner/repo`.
    pub repo: Option<String>,
    /// Pull request number.
    pub pr: Option<u64>,
    /// API token for the hosting platform.
    pub token: Option<String>,
}

/// LLM session API settings.
///
/// # Examples
///
/// ```
/// use quorum_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4.1");
/// assert_eq!(config.timeout_secs, 120);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier passed at session creation.
    #[serde(default = "default_model")]
    pub model: String,
    /// Custom base URL for the session API.
    pub base_url: Option<String>,
    /// Explicit API credential; highest priority in resolution.
    pub api_key: Option<String>,
    /// Upper bound for a single send-and-await call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4.1".into()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Diff truncation ceilings.
///
/// Each file's patch is capped independently before the aggregate ceiling is
/// applied across all files.
///
/// # Examples
///
/// ```
/// use quorum_core::LimitConfig;
///
/// let limits = LimitConfig::default();
/// assert_eq!(limits.per_file_chars, 3_000);
/// assert_eq!(limits.total_chars, 50_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Character ceiling for a single file's patch (default: 3,000).
    #[serde(default = "default_per_file_chars")]
    pub per_file_chars: usize,
    /// Aggregate character ceiling across all patches (default: 50,000).
    #[serde(default = "default_total_chars")]
    pub total_chars: usize,
}

fn default_per_file_chars() -> usize {
    3_000
}

fn default_total_chars() -> usize {
    50_000
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            per_file_chars: default_per_file_chars(),
            total_chars: default_total_chars(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = QuorumConfig::default();
        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.limits.per_file_chars, 3_000);
        assert_eq!(config.limits.total_chars, 50_000);
        assert!(config.github.repo.is_none());
        assert!(config.github.pr.is_none());
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[github]
repo = "octocat/hello-world"
pr = 7
"#;
        let config = QuorumConfig::from_toml(toml).unwrap();
        assert_eq!(config.github.repo.as_deref(), Some("octocat/hello-world"));
        assert_eq!(config.github.pr, Some(7));
        assert_eq!(config.limits.per_file_chars, 3_000);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[github]
repo = "acme/widgets"
pr = 12

[llm]
model = "gpt-4o-mini"
base_url = "http://localhost:8080"
timeout_secs = 30

[limits]
per_file_chars = 1000
total_chars = 9000
"#;
        let config = QuorumConfig::from_toml(toml).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.limits.per_file_chars, 1000);
        assert_eq!(config.limits.total_chars, 9000);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = QuorumConfig::from_toml("").unwrap();
        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.limits.total_chars, 50_000);
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = QuorumConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn from_file_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".quorum.toml");
        std::fs::write(&path, "[github]\nrepo = \"a/b\"\npr = 1\n").unwrap();
        let config = QuorumConfig::from_file(&path).unwrap();
        assert_eq!(config.github.repo.as_deref(), Some("a/b"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = QuorumConfig::from_toml(
            "[github]\nrepo = \"from/file\"\npr = 1\n",
        )
        .unwrap();
        let vars = env(&[("QUORUM_REPO", "from/env"), ("QUORUM_PR", "99")]);
        config.apply_env_from(|k| vars.get(k).cloned());
        assert_eq!(config.github.repo.as_deref(), Some("from/env"));
        assert_eq!(config.github.pr, Some(99));
    }

    #[test]
    fn generic_env_names_fill_missing_values() {
        let mut config = QuorumConfig::default();
        let vars = env(&[
            ("GITHUB_REPOSITORY", "ci/repo"),
            ("PR_NUMBER", "3"),
            ("GH_TOKEN", "ghs_abc"),
        ]);
        config.apply_env_from(|k| vars.get(k).cloned());
        assert_eq!(config.github.repo.as_deref(), Some("ci/repo"));
        assert_eq!(config.github.pr, Some(3));
        assert_eq!(config.github.token.as_deref(), Some("ghs_abc"));
    }

    #[test]
    fn dedicated_env_names_beat_generic_ones() {
        let mut config = QuorumConfig::default();
        let vars = env(&[
            ("QUORUM_REPO", "dedicated/repo"),
            ("GITHUB_REPOSITORY", "generic/repo"),
        ]);
        config.apply_env_from(|k| vars.get(k).cloned());
        assert_eq!(config.github.repo.as_deref(), Some("dedicated/repo"));
    }

    #[test]
    fn unparseable_pr_number_is_ignored() {
        let mut config = QuorumConfig::default();
        let vars = env(&[("QUORUM_PR", "not-a-number")]);
        config.apply_env_from(|k| vars.get(k).cloned());
        assert!(config.github.pr.is_none());
    }

    #[test]
    fn target_requires_owner_slash_repo() {
        let mut config = QuorumConfig::default();
        config.github.repo = Some("no-slash".into());
        config.github.pr = Some(1);
        assert!(config.target().is_err());

        config.github.repo = Some("/repo".into());
        assert!(config.target().is_err());
    }

    #[test]
    fn target_requires_pr_number() {
        let mut config = QuorumConfig::default();
        config.github.repo = Some("a/b".into());
        assert!(config.target().is_err());
    }

    #[test]
    fn credential_priority_explicit_wins() {
        let mut config = QuorumConfig::default();
        config.llm.api_key = Some("explicit".into());
        let vars = env(&[("COPILOT_API_KEY", "dedicated"), ("GITHUB_TOKEN", "generic")]);
        let key = config
            .llm_credential_from(|k| vars.get(k).cloned(), Some("cached".into()))
            .unwrap();
        assert_eq!(key, "explicit");
    }

    #[test]
    fn credential_priority_dedicated_env_beats_generic() {
        let config = QuorumConfig::default();
        let vars = env(&[("COPILOT_API_KEY", "dedicated"), ("GITHUB_TOKEN", "generic")]);
        let key = config
            .llm_credential_from(|k| vars.get(k).cloned(), None)
            .unwrap();
        assert_eq!(key, "dedicated");
    }

    #[test]
    fn credential_falls_back_to_generic_then_cache() {
        let config = QuorumConfig::default();
        let vars = env(&[("GH_TOKEN", "generic")]);
        let key = config
            .llm_credential_from(|k| vars.get(k).cloned(), Some("cached".into()))
            .unwrap();
        assert_eq!(key, "generic");

        let key = config
            .llm_credential_from(|_| None, Some("cached".into()))
            .unwrap();
        assert_eq!(key, "cached");
    }

    #[test]
    fn credential_missing_everywhere_is_auth_error() {
        let config = QuorumConfig::default();
        let result = config.llm_credential_from(|_| None, None);
        assert!(matches!(result, Err(crate::QuorumError::Auth(_))));
    }
}
