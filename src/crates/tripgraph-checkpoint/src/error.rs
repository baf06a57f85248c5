//! Error types for state store operations

use thiserror::Error;

/// Result type for state store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while persisting or loading conversation state
///
/// An unknown thread is never an error: [`StateStore::load`](crate::StateStore::load)
/// returns `Ok(None)` for it.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Thread identifier cannot be used as a storage key
    #[error("Invalid thread id: {0:?}")]
    InvalidThreadId(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend unavailable or refused the operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
