//! Graph structure: nodes, edges and typed routing
//!
//! A [`Graph`] is the validated, immutable result of
//! [`StateGraph::compile`](crate::builder::StateGraph). Every node has
//! exactly one outgoing [`Edge`]: either a direct edge to a fixed target, or
//! a conditional edge whose guard inspects the state and picks one of a
//! closed set of [`Route`]s.
//!
//! ```text
//!   START ──► classify ──┬─(chat)──► reply ──► END
//!                        └─(task)──► plan ───► END
//! ```

use crate::error::{GraphError, Result};
use crate::node::Node;
use crate::state::GraphState;
use std::collections::HashMap;
use std::sync::Arc;

/// Identifier for a node
pub type NodeId = String;

/// Virtual node where every turn begins
pub const START: &str = "__start__";

/// Virtual node that ends a turn
pub const END: &str = "__end__";

/// A closed set of routing outcomes for a conditional edge
///
/// Implemented by small `Copy` enums. `ALL` lists every variant; it is used
/// to validate that every outcome maps to an existing node and to draw the
/// graph. The target table passed alongside the guard is an exhaustive
/// `match`, so adding a variant without a target does not compile.
///
/// ```rust
/// use tripgraph_core::graph::Route;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Quality {
///     Good,
///     Retry,
/// }
///
/// impl Route for Quality {
///     const ALL: &'static [Self] = &[Quality::Good, Quality::Retry];
///
///     fn label(self) -> &'static str {
///         match self {
///             Quality::Good => "good",
///             Quality::Retry => "retry",
///         }
///     }
/// }
/// ```
pub trait Route: Copy + Send + Sync + 'static {
    /// Every possible outcome
    const ALL: &'static [Self];

    /// Stable name used in logs and diagrams
    fn label(self) -> &'static str;
}

/// One possible outcome of a conditional edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Route label
    pub label: &'static str,
    /// Node the route leads to (or [`END`])
    pub target: NodeId,
}

/// Type-erased guard: returns the label of the chosen route
pub(crate) type Router<S> = Arc<dyn Fn(&S) -> &'static str + Send + Sync>;

/// Outgoing edge of a node
pub enum Edge<S> {
    /// Always continue with the given node
    Direct(NodeId),

    /// Let a guard pick among fixed branches
    Conditional {
        /// Guard evaluated against the merged state
        router: Router<S>,
        /// Every outcome the guard can produce
        branches: Vec<Branch>,
    },
}

impl<S> Edge<S> {
    /// Every node this edge can lead to
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(to) => vec![to.as_str()],
            Edge::Conditional { branches, .. } => {
                branches.iter().map(|b| b.target.as_str()).collect()
            }
        }
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self, Edge::Conditional { .. })
    }
}

impl<S> Clone for Edge<S> {
    fn clone(&self) -> Self {
        match self {
            Edge::Direct(to) => Edge::Direct(to.clone()),
            Edge::Conditional { router, branches } => Edge::Conditional {
                router: Arc::clone(router),
                branches: branches.clone(),
            },
        }
    }
}

impl<S> std::fmt::Debug for Edge<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(node_id) => f.debug_tuple("Direct").field(node_id).finish(),
            Edge::Conditional { branches, .. } => f
                .debug_struct("Conditional")
                .field("router", &"<function>")
                .field("branches", branches)
                .finish(),
        }
    }
}

/// Where execution goes after a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Next node, or [`END`]
    pub next: NodeId,
    /// Route label when the edge was conditional
    pub route: Option<&'static str>,
}

/// Validated graph of nodes and edges
pub struct Graph<S> {
    pub(crate) order: Vec<NodeId>,
    pub(crate) nodes: HashMap<NodeId, Arc<dyn Node<S>>>,
    pub(crate) edges: HashMap<NodeId, Edge<S>>,
    pub(crate) entry: NodeId,
}

impl<S: GraphState> Graph<S> {
    /// First node of every turn
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Node names in insertion order
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn node(&self, id: &str) -> Option<&Arc<dyn Node<S>>> {
        self.nodes.get(id)
    }

    /// Outgoing edge of `id`
    pub fn edge(&self, id: &str) -> Option<&Edge<S>> {
        self.edges.get(id)
    }

    /// Evaluate the outgoing edge of `from` against `state`
    pub fn transition(&self, from: &str, state: &S) -> Result<Transition> {
        let edge = self.edges.get(from).ok_or_else(|| GraphError::UnknownNode {
            from: from.to_string(),
            to: "<no outgoing edge>".to_string(),
        })?;

        match edge {
            Edge::Direct(to) => Ok(Transition {
                next: to.clone(),
                route: None,
            }),
            Edge::Conditional { router, branches } => {
                let label = router(state);
                let branch = branches
                    .iter()
                    .find(|b| b.label == label)
                    .ok_or_else(|| GraphError::UnknownNode {
                        from: from.to_string(),
                        to: label.to_string(),
                    })?;
                Ok(Transition {
                    next: branch.target.clone(),
                    route: Some(branch.label),
                })
            }
        }
    }
}

impl<S> std::fmt::Debug for Graph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("entry", &self.entry)
            .field("nodes", &self.order)
            .field("edges", &self.edges)
            .finish()
    }
}
