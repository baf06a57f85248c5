//! Error types for the travel workflow
//!
//! Two very different kinds of failure live here:
//!
//! - [`StepFailure`] - a model call or parse inside a node went wrong. These
//!   never leave the node; it logs them and returns a degraded update.
//! - [`ServiceError`] - a turn could not be completed at all (store fault,
//!   deadline, step limit) or the request itself was malformed.
//!
//! ```rust
//! use tripgraph_travel::ServiceError;
//!
//! let err = ServiceError::InvalidRequest("thread_id is empty".to_string());
//! assert!(!err.is_store_fault());
//! ```

use thiserror::Error;
use tripgraph_core::{CapabilityError, ExtractionError, GraphError};

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced to callers of the turn service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Executor or store failure; conversational degradation never ends up here
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Request rejected before any state was touched
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// Whether persistence was unavailable
    pub fn is_store_fault(&self) -> bool {
        matches!(self, ServiceError::Graph(err) if err.is_store_fault())
    }

    /// Whether the turn deadline elapsed
    pub fn is_timeout(&self) -> bool {
        matches!(self, ServiceError::Graph(err) if err.is_timeout())
    }
}

/// Why a node fell back to its degraded default
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepFailure {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Output parsed but carried nothing usable
    #[error("empty result: {0}")]
    Empty(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failure_messages() {
        let err: StepFailure = CapabilityError::Timeout(500).into();
        assert_eq!(err.to_string(), "Request timed out after 500ms");

        let err: StepFailure = ExtractionError::NoJson.into();
        assert_eq!(err.to_string(), "no JSON value found in model output");
    }

    #[test]
    fn test_service_error_kinds() {
        let err = ServiceError::from(GraphError::StepLimitExceeded {
            thread_id: "t".into(),
            limit: 3,
        });
        assert!(!err.is_store_fault());
        assert!(!err.is_timeout());
        assert!(!ServiceError::InvalidRequest("x".into()).is_timeout());
    }
}
