//! Configuration for remote LLM providers.

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API, without the `/chat/completions` suffix.
    pub base_url: String,

    /// Model name/identifier.
    pub model: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Retries after the first attempt for retryable failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff: Duration,

    /// Organization ID (optional).
    pub organization: Option<String>,
}

impl RemoteLlmConfig {
    /// Create a new remote LLM configuration.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            initial_backoff: default_initial_backoff(),
            organization: None,
        }
    }

    /// Create configuration with the API key read from `env_var`.
    pub fn from_env(
        env_var: &str,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = std::env::var(env_var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::ApiKeyNotFound(format!("Environment variable: {}", env_var)))?;

        Ok(Self::new(api_key, base_url, model))
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Set the organization ID.
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(Duration::from_secs(30))
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff() -> Duration {
    Duration::from_millis(500)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_config_builder() {
        let config = RemoteLlmConfig::new("test-key", DEFAULT_BASE_URL, "gpt-4o")
            .with_timeout(Duration::from_secs(120))
            .with_max_retries(4)
            .with_organization("org-123");

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.organization, Some("org-123".to_string()));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RemoteLlmConfig::new("k", DEFAULT_BASE_URL, DEFAULT_MODEL)
            .with_initial_backoff(Duration::from_millis(250));

        assert_eq!(config.backoff_for(0), Duration::from_millis(250));
        assert_eq!(config.backoff_for(1), Duration::from_millis(500));
        assert_eq!(config.backoff_for(2), Duration::from_secs(1));
        assert_eq!(config.backoff_for(20), Duration::from_secs(30));
    }

    #[test]
    fn test_from_env_missing_key() {
        let err = RemoteLlmConfig::from_env(
            "TRIPGRAPH_TEST_KEY_THAT_IS_NEVER_SET",
            DEFAULT_BASE_URL,
            DEFAULT_MODEL,
        )
        .unwrap_err();
        assert!(err.is_auth_error());
    }
}
