//! CompiledGraph struct and builder methods

use super::types::ExecutionConfig;
use crate::graph::Graph;
use crate::llm::{CapabilityError, CapabilityResult, ChatModel, ChatRequest, ChatResponse};
use crate::state::{GraphState, StateSchema};
use crate::visualization::draw_mermaid;
use async_trait::async_trait;
use std::sync::Arc;
use tripgraph_checkpoint::{InMemoryStateStore, StateStore, ThreadLocks};

/// Validated graph bound to a store, a capability provider and limits
///
/// Cheap to clone; clones share the store, the model and the per-thread
/// locks, so a clone can serve turns concurrently with the original.
pub struct CompiledGraph<S> {
    pub(crate) graph: Arc<Graph<S>>,
    pub(crate) schema: Arc<StateSchema>,
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) locks: ThreadLocks,
    pub(crate) model: Arc<dyn ChatModel>,
    pub(crate) config: ExecutionConfig,
}

impl<S: GraphState> CompiledGraph<S> {
    /// Wrap a graph with an in-memory store and no capability provider
    pub(crate) fn new(graph: Graph<S>) -> Self {
        Self {
            graph: Arc::new(graph),
            schema: Arc::new(S::schema()),
            store: Arc::new(InMemoryStateStore::new()),
            locks: ThreadLocks::new(),
            model: Arc::new(UnconfiguredModel),
            config: ExecutionConfig::default(),
        }
    }

    /// Set the state store
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = store;
        self
    }

    /// Set the capability provider handed to every node
    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = model;
        self
    }

    /// Set execution limits and persistence policy
    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &Graph<S> {
        &self.graph
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Mermaid flowchart of the graph
    pub fn draw_mermaid(&self) -> String {
        draw_mermaid(&self.graph)
    }
}

impl<S> Clone for CompiledGraph<S> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            schema: Arc::clone(&self.schema),
            store: Arc::clone(&self.store),
            locks: self.locks.clone(),
            model: Arc::clone(&self.model),
            config: self.config.clone(),
        }
    }
}

/// Placeholder provider until [`CompiledGraph::with_model`] is called
struct UnconfiguredModel;

#[async_trait]
impl ChatModel for UnconfiguredModel {
    async fn chat(&self, _request: ChatRequest) -> CapabilityResult<ChatResponse> {
        Err(CapabilityError::Transport(
            "no chat model configured".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        "unconfigured"
    }
}
