//! # tripgraph-checkpoint
//!
//! Persistence for per-conversation graph state.
//!
//! Each conversation (thread) maps to exactly one [`StateRecord`]: the JSON
//! serialization of its accumulated state plus a save counter and timestamp.
//! The crate is schema-agnostic; `tripgraph-core` owns the typed state and
//! converts it to and from the stored JSON.
//!
//! - [`StateStore`] - async load/save contract
//! - [`InMemoryStateStore`] - process-local backend
//! - [`FileStateStore`] - one JSON file per thread
//! - [`ThreadLocks`] - at most one in-flight turn per thread
//!
//! ```rust
//! use tripgraph_checkpoint::{InMemoryStateStore, StateStore, ThreadLocks};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryStateStore::new();
//! let locks = ThreadLocks::new();
//!
//! let _turn = locks.acquire("thread-1").await;
//! let current = store.load("thread-1").await?;
//! assert!(current.is_none());
//!
//! store.save("thread-1", json!({"messages": []})).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod file;
pub mod locks;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::FileStateStore;
pub use locks::{ThreadGuard, ThreadLocks};
pub use memory::InMemoryStateStore;
pub use record::{StateRecord, ThreadId};
pub use traits::StateStore;
