//! Per-thread mutual exclusion
//!
//! A turn loads state, mutates it across many steps, and saves it. Two turns
//! on the same thread running at once would race on that load/merge/save
//! cycle, so the executor holds a [`ThreadGuard`] for the whole turn. Guards
//! for different threads never contend. A thread's entry leaves the registry
//! once nobody holds or awaits it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Guard proving exclusive access to one thread until dropped
#[derive(Debug)]
pub struct ThreadGuard {
    // released before the registration is pruned
    _guard: OwnedMutexGuard<()>,
    registration: Registration,
}

impl ThreadGuard {
    /// Thread this guard protects
    pub fn thread_id(&self) -> &str {
        &self.registration.thread_id
    }
}

/// Interest in one registry entry; the last one out removes it
#[derive(Debug)]
struct Registration {
    locks: Registry,
    thread_id: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        let unused = locks
            .get(&self.thread_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            locks.remove(&self.thread_id);
        }
    }
}

/// Registry of per-thread async locks
///
/// Cloning is cheap; clones share the registry.
#[derive(Debug, Clone, Default)]
pub struct ThreadLocks {
    locks: Registry,
}

impl ThreadLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, thread_id: &str) -> (Registration, Arc<AsyncMutex<()>>) {
        let lock = self
            .locks
            .lock()
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        let registration = Registration {
            locks: self.locks.clone(),
            thread_id: thread_id.to_string(),
        };
        (registration, lock)
    }

    /// Wait until no other turn holds `thread_id`, then take it
    ///
    /// Dropping the returned future before it resolves gives up the wait.
    pub async fn acquire(&self, thread_id: &str) -> ThreadGuard {
        let (registration, lock) = self.register(thread_id);
        let guard = lock.lock_owned().await;
        ThreadGuard {
            _guard: guard,
            registration,
        }
    }

    /// Take `thread_id` only if it is free right now
    pub fn try_acquire(&self, thread_id: &str) -> Option<ThreadGuard> {
        let (registration, lock) = self.register(thread_id);
        let guard = lock.try_lock_owned().ok()?;
        Some(ThreadGuard {
            _guard: guard,
            registration,
        })
    }

    /// Number of threads currently held or awaited
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Whether no thread is held or awaited
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
