//! Failures of a text-generation call

use thiserror::Error;

/// Result type for capability calls
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;

/// Why a [`ChatModel`](super::ChatModel) call produced no text
///
/// Nodes absorb every variant into a degraded update; none of these ever
/// aborts a turn by itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// Provider did not answer in time
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Provider refused the call because of rate or quota limits
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network, authentication or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),
}

impl CapabilityError {
    /// Whether retrying the same request later could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CapabilityError::Timeout(_) | CapabilityError::RateLimited(_)
        )
    }
}
