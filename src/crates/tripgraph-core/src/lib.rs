//! # tripgraph-core - Cyclic state graphs for conversational workflows
//!
//! A small executor for workflows that run one *turn* at a time over a
//! persisted, per-conversation state, following a static edge table that
//! may contain cycles.
//!
//! ## Core Concepts
//!
//! - **State** ([`GraphState`]) - a serde struct plus a [`StateSchema`]
//!   declaring how each field merges (append, overwrite, shallow merge).
//! - **Nodes** ([`Node`]) - async steps that read the state and return a
//!   partial update. Nodes cannot fail; they absorb capability errors into
//!   degraded updates.
//! - **Routes** ([`Route`]) - closed enums returned by guard functions on
//!   conditional edges. The target table is an exhaustive `match`.
//! - **Capability** ([`ChatModel`]) - injected text-generation provider.
//! - **Execution** ([`CompiledGraph`]) - per-thread locking, persistence
//!   after every step, turn deadlines and a step limit, with rollback to the
//!   pre-turn state on abort.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tripgraph_core::{StateGraph, START, END};
//!
//! let mut builder = StateGraph::<MyState>::new();
//! builder
//!     .add_node("classify", ClassifyNode)
//!     .add_node("answer", AnswerNode)
//!     .add_edge(START, "classify")
//!     .add_conditional_edge("classify", route_intent, |r| match r {
//!         Intent::Question => "answer",
//!         Intent::Bye => END,
//!     })
//!     .add_edge("answer", END);
//!
//! let graph = builder.compile()?.with_model(model);
//! let outcome = graph.invoke("thread-1", MyUpdate::user("hello")).await?;
//! ```
//!
//! ## Termination
//!
//! The executor does not detect cycles. Graphs with cycles must route every
//! cycle through a counter and guard it with a finite bound; the
//! configurable `max_steps` limit is a backstop, not a substitute.

pub mod builder;
pub mod compiled;
pub mod error;
pub mod extract;
pub mod graph;
pub mod llm;
pub mod messages;
pub mod node;
pub mod state;
pub mod visualization;

pub use builder::StateGraph;
pub use compiled::{CompiledGraph, ExecutionConfig, PersistMode, TurnOutcome, DEFAULT_MAX_STEPS};
pub use error::{GraphError, Result};
pub use extract::{extract_json, extract_json_as, ExtractionError};
pub use graph::{Branch, Edge, Graph, NodeId, Route, Transition, END, START};
pub use llm::{CapabilityError, ChatModel, ChatRequest, ChatResponse};
pub use messages::{Message, MessageRole};
pub use node::{pure_node, FnNode, Node, NodeContext};
pub use state::{
    AppendReducer, GraphState, MergeReducer, OverwriteReducer, Reducer, StateError, StateSchema,
};
pub use visualization::draw_mermaid;
