//! Error types for LLM provider implementations.

use std::time::Duration;
use thiserror::Error;
use tripgraph_core::llm::CapabilityError;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when working with LLM providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to serialize/deserialize data.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// API authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// API key not found in environment.
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Provider service unavailable (5xx).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Invalid response from provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// General provider error.
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::HttpError(e) => e.is_timeout() || e.is_connect(),
            LlmError::ServiceUnavailable(_)
            | LlmError::Timeout(_)
            | LlmError::RateLimitExceeded(_) => true,
            _ => false,
        }
    }

    /// Check if this error is due to authentication.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            LlmError::AuthenticationError(_) | LlmError::ApiKeyNotFound(_)
        )
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => LlmError::AuthenticationError(body),
            408 => LlmError::ServiceUnavailable(format!("request timeout: {}", body)),
            429 => LlmError::RateLimitExceeded(body),
            500..=599 => LlmError::ServiceUnavailable(format!("{}: {}", status, body)),
            _ => LlmError::ProviderError(format!("API error {}: {}", status, body)),
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

/// Convert LlmError into the capability failure nodes see.
impl From<LlmError> for CapabilityError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(d) => CapabilityError::Timeout(d.as_millis() as u64),
            LlmError::RateLimitExceeded(msg) => CapabilityError::RateLimited(msg),
            other => CapabilityError::Transport(other.to_string()),
        }
    }
}
