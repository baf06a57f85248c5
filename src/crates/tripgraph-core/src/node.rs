//! Node contract
//!
//! A node reads the current state and returns a partial update. Nodes have
//! no error channel: a node whose capability call fails, or whose output
//! cannot be parsed, must still return an update (a zero score, an empty
//! list, a fallback reply). The executor therefore only ever fails a turn
//! for infrastructure reasons.

use crate::llm::{CapabilityResult, ChatModel, ChatRequest, ChatResponse};
use crate::state::GraphState;
use async_trait::async_trait;
use std::sync::Arc;

/// Per-execution context handed to a node
#[derive(Clone)]
pub struct NodeContext {
    model: Arc<dyn ChatModel>,
    thread_id: String,
    node: String,
    step: usize,
}

impl NodeContext {
    pub fn new(
        model: Arc<dyn ChatModel>,
        thread_id: impl Into<String>,
        node: impl Into<String>,
        step: usize,
    ) -> Self {
        Self {
            model,
            thread_id: thread_id.into(),
            node: node.into(),
            step,
        }
    }

    /// Conversation this execution belongs to
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Name of the node being executed
    pub fn node(&self) -> &str {
        &self.node
    }

    /// 1-based index of this execution within the turn
    pub fn step(&self) -> usize {
        self.step
    }

    /// Shared text-generation capability
    pub fn model(&self) -> &Arc<dyn ChatModel> {
        &self.model
    }

    /// Call the model, labelling the request with this node's name
    /// unless the caller already set a task
    pub async fn chat(&self, request: ChatRequest) -> CapabilityResult<ChatResponse> {
        let request = if request.task.is_none() {
            request.with_task(self.node.clone())
        } else {
            request
        };
        self.model.chat(request).await
    }
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("model", &self.model.model_name())
            .field("thread_id", &self.thread_id)
            .field("node", &self.node)
            .field("step", &self.step)
            .finish()
    }
}

/// A processing step in a graph
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    /// Compute this node's update from the current state
    async fn run(&self, state: &S, ctx: &NodeContext) -> S::Update;
}

/// Node backed by a synchronous closure
///
/// Used for deterministic steps such as counters and filters.
pub struct FnNode<F> {
    func: F,
}

/// Wrap a synchronous function of the state as a node
pub fn pure_node<S, F>(func: F) -> FnNode<F>
where
    S: GraphState,
    F: Fn(&S) -> S::Update + Send + Sync + 'static,
{
    FnNode { func }
}

#[async_trait]
impl<S, F> Node<S> for FnNode<F>
where
    S: GraphState,
    F: Fn(&S) -> S::Update + Send + Sync + 'static,
{
    async fn run(&self, state: &S, _ctx: &NodeContext) -> S::Update {
        (self.func)(state)
    }
}

#[async_trait]
impl<S: GraphState, N: Node<S> + ?Sized> Node<S> for Arc<N> {
    async fn run(&self, state: &S, ctx: &NodeContext) -> S::Update {
        (**self).run(state, ctx).await
    }
}
