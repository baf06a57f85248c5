//! Reading and seeding thread state outside of a turn

use super::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::state::GraphState;
use tripgraph_checkpoint::StateRecord;

impl<S: GraphState> CompiledGraph<S> {
    /// Current state of `thread_id`
    ///
    /// An unseen thread yields the default state; this is not an error.
    pub async fn get_state(&self, thread_id: &str) -> Result<S> {
        match self.store.load(thread_id).await? {
            Some(record) => Ok(serde_json::from_value(record.values)?),
            None => Ok(S::default()),
        }
    }

    /// Stored record of `thread_id`, including version and timestamp
    pub async fn get_record(&self, thread_id: &str) -> Result<Option<StateRecord>> {
        Ok(self.store.load(thread_id).await?)
    }

    /// Merge `update` into the thread's state without running any node
    ///
    /// Takes the thread's lock, so it never interleaves with a turn.
    pub async fn update_state(&self, thread_id: &str, update: S::Update) -> Result<S> {
        let _guard = self.locks.acquire(thread_id).await;

        let current = match self.store.load(thread_id).await? {
            Some(record) => serde_json::from_value(record.values)?,
            None => S::default(),
        };
        let next = self
            .schema
            .merge(&current, &update)
            .map_err(|e| GraphError::state("update_state", e))?;

        self.store
            .save(thread_id, serde_json::to_value(&next)?)
            .await?;
        Ok(next)
    }

    /// Identifiers of every persisted thread
    pub async fn list_threads(&self) -> Result<Vec<String>> {
        Ok(self.store.list_threads().await?)
    }
}
