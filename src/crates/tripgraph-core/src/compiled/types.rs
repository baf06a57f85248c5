//! Executor settings and turn results

use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Node executions allowed per turn unless configured otherwise
pub const DEFAULT_MAX_STEPS: usize = 50;

/// When state is written to the store during a turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistMode {
    /// After the input merge and after every node
    #[default]
    EveryStep,
    /// Once, when the turn reaches END
    EndOfTurn,
}

/// Execution limits and persistence policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub persist_mode: PersistMode,
    /// Upper bound on node executions in one turn
    pub max_steps: usize,
    /// Deadline applied to every turn that does not pass its own
    pub deadline: Option<Duration>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            persist_mode: PersistMode::default(),
            max_steps: DEFAULT_MAX_STEPS,
            deadline: None,
        }
    }
}

impl ExecutionConfig {
    pub fn with_persist_mode(mut self, mode: PersistMode) -> Self {
        self.persist_mode = mode;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome<S> {
    /// State after the last node
    pub state: S,
    /// Executed nodes, in order
    pub path: Vec<NodeId>,
}

impl<S> TurnOutcome<S> {
    /// Number of node executions in the turn
    pub fn steps(&self) -> usize {
        self.path.len()
    }

    /// Whether `node` ran at least once
    pub fn visited(&self, node: &str) -> bool {
        self.path.iter().any(|n| n == node)
    }

    /// How many times `node` ran
    pub fn visits(&self, node: &str) -> usize {
        self.path.iter().filter(|n| *n == node).count()
    }
}
