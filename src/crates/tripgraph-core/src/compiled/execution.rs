//! Turn execution (invoke, deadlines, rollback)

use super::types::{PersistMode, TurnOutcome};
use super::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::graph::{NodeId, END, START};
use crate::node::NodeContext;
use crate::state::GraphState;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Bookkeeping visible after the turn future has been dropped
struct TurnProgress {
    node: NodeId,
    persisted: bool,
}

impl<S: GraphState> CompiledGraph<S> {
    /// Run one turn on `thread_id` using the configured default deadline
    ///
    /// `input` is merged into the stored state before the entry node runs.
    ///
    /// # Errors
    ///
    /// - [`GraphError::Store`] when the store fails
    /// - [`GraphError::DeadlineExceeded`] / [`GraphError::StepLimitExceeded`];
    ///   the stored state is restored to its pre-turn value
    /// - [`GraphError::State`] when an update cannot be merged; the update is
    ///   discarded
    pub async fn invoke(&self, thread_id: &str, input: S::Update) -> Result<TurnOutcome<S>> {
        self.invoke_with_deadline(thread_id, input, self.config.deadline)
            .await
    }

    /// Run one turn with an explicit deadline (`None` for no deadline)
    ///
    /// The deadline covers the whole turn, including time spent waiting for
    /// another turn on the same thread to finish.
    pub async fn invoke_with_deadline(
        &self,
        thread_id: &str,
        input: S::Update,
        deadline: Option<Duration>,
    ) -> Result<TurnOutcome<S>> {
        let expires = deadline.map(|limit| Instant::now() + limit);
        let expired = |node: &str| GraphError::DeadlineExceeded {
            thread_id: thread_id.to_string(),
            node: node.to_string(),
            deadline_ms: deadline.map_or(0, |limit| limit.as_millis() as u64),
        };

        let Some(_guard) = within(expires, self.locks.acquire(thread_id)).await else {
            warn!(thread_id, "Deadline passed while waiting for the thread");
            return Err(expired(START));
        };

        let snapshot = match within(expires, self.store.load(thread_id)).await {
            Some(loaded) => loaded?.map(|r| r.values),
            None => return Err(expired(START)),
        };
        let state = match &snapshot {
            Some(values) => serde_json::from_value(values.clone())?,
            None => S::default(),
        };

        info!(thread_id, resumed = snapshot.is_some(), "Turn started");

        let mut progress = TurnProgress {
            node: START.to_string(),
            persisted: false,
        };

        let run = within(expires, self.run_turn(thread_id, state, input, &mut progress)).await;
        let result = run.unwrap_or_else(|| Err(expired(&progress.node)));

        match result {
            Ok(outcome) => {
                info!(thread_id, steps = outcome.steps(), "Turn finished");
                Ok(outcome)
            }
            Err(err @ (GraphError::DeadlineExceeded { .. } | GraphError::StepLimitExceeded { .. })) => {
                warn!(thread_id, node = %progress.node, error = %err, "Turn aborted, restoring state");
                if progress.persisted {
                    self.restore(thread_id, snapshot).await?;
                }
                Err(err)
            }
            Err(err) => {
                warn!(thread_id, node = %progress.node, error = %err, "Turn failed");
                Err(err)
            }
        }
    }

    async fn run_turn(
        &self,
        thread_id: &str,
        state: S,
        input: S::Update,
        progress: &mut TurnProgress,
    ) -> Result<TurnOutcome<S>> {
        let every_step = self.config.persist_mode == PersistMode::EveryStep;

        let mut state = self
            .schema
            .merge(&state, &input)
            .map_err(|e| GraphError::state(START, e))?;

        if every_step {
            self.persist(thread_id, &state).await?;
            progress.persisted = true;
        }

        let mut path = Vec::new();
        let mut current = self.graph.entry().to_string();

        while current != END {
            if path.len() >= self.config.max_steps {
                return Err(GraphError::StepLimitExceeded {
                    thread_id: thread_id.to_string(),
                    limit: self.config.max_steps,
                });
            }

            let node = self
                .graph
                .node(&current)
                .ok_or_else(|| GraphError::UnknownNode {
                    from: progress.node.clone(),
                    to: current.clone(),
                })?;

            progress.node = current.clone();
            let step = path.len() + 1;
            debug!(thread_id, node = %current, step, "Running node");

            let ctx = NodeContext::new(self.model.clone(), thread_id, current.clone(), step);
            let update = node.run(&state, &ctx).await;

            let merged = self
                .schema
                .merge(&state, &update)
                .and_then(|s| self.schema.record_step(&s, &current))
                .map_err(|e| GraphError::state(current.clone(), e))?;
            state = merged;
            path.push(current.clone());

            if every_step {
                self.persist(thread_id, &state).await?;
                progress.persisted = true;
            }

            let transition = self.graph.transition(&current, &state)?;
            if let Some(route) = transition.route {
                debug!(thread_id, node = %current, route, next = %transition.next, "Guard decision");
            }
            current = transition.next;
        }

        if !every_step {
            self.persist(thread_id, &state).await?;
        }

        Ok(TurnOutcome { state, path })
    }

    async fn persist(&self, thread_id: &str, state: &S) -> Result<()> {
        let values = serde_json::to_value(state)?;
        self.store.save(thread_id, values).await?;
        Ok(())
    }

    /// Put the store back as it was before an aborted turn
    ///
    /// A thread that had no record before the turn has none afterwards.
    async fn restore(&self, thread_id: &str, snapshot: Option<Value>) -> Result<()> {
        match snapshot {
            Some(values) => {
                self.store.save(thread_id, values).await?;
            }
            None => self.store.delete_thread(thread_id).await?,
        }
        Ok(())
    }
}

/// Await `fut` until `expires`; `None` when the deadline passes first
async fn within<F: Future>(expires: Option<Instant>, fut: F) -> Option<F::Output> {
    match expires {
        Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}
