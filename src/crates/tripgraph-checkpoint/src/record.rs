//! Persisted state record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Thread identifier - the key under which one conversation's state is stored
pub type ThreadId = String;

/// One persisted conversation state
///
/// `values` holds the serialized state object exactly as the executor
/// produced it; the store never interprets its fields. `version` starts at 1
/// on the first save of a thread and increases by one on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Thread the record belongs to
    pub thread_id: ThreadId,

    /// Serialized state values
    pub values: Value,

    /// Save counter for this thread
    pub version: u64,

    /// Time of the last save
    pub updated_at: DateTime<Utc>,
}

impl StateRecord {
    /// Create the first record for a thread
    pub fn new(thread_id: impl Into<ThreadId>, values: Value) -> Self {
        Self {
            thread_id: thread_id.into(),
            values,
            version: 1,
            updated_at: Utc::now(),
        }
    }

    /// Produce the record that follows this one after saving `values`
    pub fn next(&self, values: Value) -> Self {
        Self {
            thread_id: self.thread_id.clone(),
            values,
            version: self.version + 1,
            updated_at: Utc::now(),
        }
    }
}
