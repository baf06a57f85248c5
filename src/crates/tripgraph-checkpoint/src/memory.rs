//! In-memory state store
//!
//! Reference implementation of [`StateStore`] backed by a
//! `tokio::sync::RwLock<HashMap<..>>`. Suitable for tests, the offline CLI
//! mode, and single-process deployments where losing state on restart is
//! acceptable.
//!
//! Values are stored as owned JSON, so a record handed out by `load` is a
//! copy: mutating it never affects the stored state or another thread.

use crate::error::{Result, StoreError};
use crate::record::{StateRecord, ThreadId};
use crate::traits::StateStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type RecordStorage = Arc<RwLock<HashMap<ThreadId, StateRecord>>>;

/// In-memory [`StateStore`]
///
/// Cloning is cheap and clones share the same storage.
///
/// # Example
///
/// ```rust
/// use tripgraph_checkpoint::{InMemoryStateStore, StateStore};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryStateStore::new();
/// store.save("thread-1", json!({"messages": []})).await?;
///
/// let record = store.load("thread-1").await?.unwrap();
/// assert_eq!(record.version, 1);
/// assert!(store.load("unknown").await?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStore {
    storage: RecordStorage,
}

impl InMemoryStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of threads with a record
    pub async fn thread_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Drop every record (test helper)
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, thread_id: &str) -> Result<Option<StateRecord>> {
        if thread_id.is_empty() {
            return Err(StoreError::InvalidThreadId(thread_id.to_string()));
        }
        Ok(self.storage.read().await.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, values: Value) -> Result<StateRecord> {
        if thread_id.is_empty() {
            return Err(StoreError::InvalidThreadId(thread_id.to_string()));
        }

        let mut storage = self.storage.write().await;
        let record = match storage.get(thread_id) {
            Some(existing) => existing.next(values),
            None => StateRecord::new(thread_id, values),
        };
        storage.insert(thread_id.to_string(), record.clone());

        Ok(record)
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.storage.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.storage.write().await.remove(thread_id);
        Ok(())
    }
}
