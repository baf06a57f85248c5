//! The [`StateStore`] trait - persistence contract for conversation state
//!
//! A store maps a thread identifier to at most one [`StateRecord`]. The
//! executor loads the record at the start of a turn, and saves the merged
//! state after every node (or once at the end of the turn, depending on its
//! persist mode).
//!
//! # Guarantees required of implementations
//!
//! - **Read-your-writes**: a `save` that completes before a later `load` of the
//!   same thread is visible to that `load`.
//! - **Isolation**: records of distinct threads share no mutable data. Saving
//!   thread `a` never changes what `load("b")` returns.
//! - **Unknown threads are not errors**: `load` returns `Ok(None)`.
//!
//! Implementations do not need to serialize concurrent turns on the same
//! thread; that is what [`ThreadLocks`](crate::ThreadLocks) is for.
//!
//! # Implementing a backend
//!
//! ```rust,ignore
//! use tripgraph_checkpoint::{StateRecord, StateStore, Result};
//! use async_trait::async_trait;
//! use serde_json::Value;
//!
//! struct RedisStateStore { /* connection pool */ }
//!
//! #[async_trait]
//! impl StateStore for RedisStateStore {
//!     async fn load(&self, thread_id: &str) -> Result<Option<StateRecord>> {
//!         // GET thread:<id>, deserialize
//!         todo!()
//!     }
//!
//!     async fn save(&self, thread_id: &str, values: Value) -> Result<StateRecord> {
//!         // read current version, SET thread:<id> with version + 1
//!         todo!()
//!     }
//!
//!     async fn list_threads(&self) -> Result<Vec<String>> {
//!         todo!()
//!     }
//!
//!     async fn delete_thread(&self, thread_id: &str) -> Result<()> {
//!         // DEL thread:<id>
//!         todo!()
//!     }
//! }
//! ```

use crate::error::Result;
use crate::record::StateRecord;
use async_trait::async_trait;
use serde_json::Value;

/// Persistence backend for per-thread conversation state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the record for `thread_id`, or `None` if the thread was never saved
    async fn load(&self, thread_id: &str) -> Result<Option<StateRecord>>;

    /// Replace the record for `thread_id` with `values`
    ///
    /// Returns the record as stored, including its new version.
    async fn save(&self, thread_id: &str, values: Value) -> Result<StateRecord>;

    /// Identifiers of every thread that has a record, sorted
    async fn list_threads(&self) -> Result<Vec<String>>;

    /// Remove the record for `thread_id`; removing an absent record is not an error
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Whether a record exists for `thread_id`
    async fn contains(&self, thread_id: &str) -> Result<bool> {
        Ok(self.load(thread_id).await?.is_some())
    }
}
