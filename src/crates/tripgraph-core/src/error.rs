//! Error types for graph construction and execution
//!
//! Only infrastructure failures reach the caller of a turn. Content
//! generation and parsing failures are absorbed inside nodes (nodes cannot
//! return errors at all, see [`Node`](crate::node::Node)), so the variants
//! here describe problems with the graph itself, the store, or the turn's
//! time budget.
//!
//! ```text
//! GraphError
//! ├── Validation         - Graph structure errors (compile time)
//! ├── UnknownNode        - Edge resolved to a node that does not exist
//! ├── State              - Update could not be merged (not applied)
//! ├── Store              - Persistence layer failure
//! ├── Serialization      - State could not be (de)serialized
//! ├── DeadlineExceeded   - Turn deadline elapsed; state rolled back
//! └── StepLimitExceeded  - Turn ran more nodes than allowed; state rolled back
//! ```

use crate::state::StateError;
use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while building or running a graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph structure validation failed
    ///
    /// Raised by `StateGraph::compile` for a missing entry, dangling edge
    /// targets, nodes without an outgoing edge, or unreachable nodes.
    #[error("Graph validation failed: {0}")]
    Validation(String),

    /// A router returned a node that is not part of the graph
    #[error("Node '{from}' routed to unknown node '{to}'")]
    UnknownNode {
        /// Node whose edge was evaluated
        from: String,
        /// Missing target
        to: String,
    },

    /// A node's update could not be merged into the state
    ///
    /// The update is discarded as a whole; the state is left as it was
    /// before the node ran.
    #[error("State error in node '{node}': {error}")]
    State {
        /// Node that produced the update
        node: String,
        /// Underlying merge failure
        #[source]
        error: StateError,
    },

    /// Persistence layer failure
    ///
    /// Not recoverable inside the turn; surfaced to the caller as an
    /// infrastructure fault.
    #[error("Store error: {0}")]
    Store(#[from] tripgraph_checkpoint::StoreError),

    /// Stored or produced state could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The turn's deadline elapsed
    ///
    /// The in-flight node was aborted and its update discarded. The thread's
    /// state is what it was before the turn began.
    #[error("Turn on thread '{thread_id}' exceeded its deadline of {deadline_ms}ms (last node: {node})")]
    DeadlineExceeded {
        /// Thread the turn was running on
        thread_id: String,
        /// Node that was executing (or about to execute) when time ran out
        node: String,
        /// Deadline in milliseconds
        deadline_ms: u64,
    },

    /// The turn executed more nodes than the configured maximum
    ///
    /// Treated like a deadline abort: state is rolled back to the start of
    /// the turn.
    #[error("Turn on thread '{thread_id}' exceeded the step limit of {limit}")]
    StepLimitExceeded {
        /// Thread the turn was running on
        thread_id: String,
        /// Configured maximum number of node executions
        limit: usize,
    },
}

impl GraphError {
    /// Whether this error came from the persistence layer
    pub fn is_store_fault(&self) -> bool {
        matches!(self, GraphError::Store(_))
    }

    /// Whether the turn was aborted for running out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, GraphError::DeadlineExceeded { .. })
    }

    pub(crate) fn state(node: impl Into<String>, error: StateError) -> Self {
        Self::State {
            node: node.into(),
            error,
        }
    }
}
