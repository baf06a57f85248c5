//! Fluent construction of state graphs
//!
//! ```rust
//! use tripgraph_core::builder::StateGraph;
//! use tripgraph_core::graph::{Route, END, START};
//! use tripgraph_core::node::pure_node;
//! use tripgraph_core::state::{GraphState, OverwriteReducer, StateSchema};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Default, Serialize, Deserialize)]
//! struct Count {
//!     n: u32,
//! }
//!
//! #[derive(Serialize)]
//! struct CountUpdate {
//!     n: u32,
//! }
//!
//! impl GraphState for Count {
//!     type Update = CountUpdate;
//!     fn schema() -> StateSchema {
//!         StateSchema::new().with_field("n", OverwriteReducer)
//!     }
//! }
//!
//! #[derive(Clone, Copy)]
//! enum Loop {
//!     Again,
//!     Done,
//! }
//!
//! impl Route for Loop {
//!     const ALL: &'static [Self] = &[Loop::Again, Loop::Done];
//!     fn label(self) -> &'static str {
//!         match self {
//!             Loop::Again => "again",
//!             Loop::Done => "done",
//!         }
//!     }
//! }
//!
//! let mut builder = StateGraph::<Count>::new();
//! builder
//!     .add_node("inc", pure_node(|s: &Count| CountUpdate { n: s.n + 1 }))
//!     .add_edge(START, "inc")
//!     .add_conditional_edge(
//!         "inc",
//!         |s: &Count| if s.n < 3 { Loop::Again } else { Loop::Done },
//!         |route| match route {
//!             Loop::Again => "inc",
//!             Loop::Done => END,
//!         },
//!     );
//!
//! let graph = builder.build().unwrap();
//! assert_eq!(graph.entry(), "inc");
//! ```

use crate::compiled::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::graph::{Branch, Edge, Graph, NodeId, Route, END, START};
use crate::node::Node;
use crate::state::GraphState;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Builder for a [`Graph`]
///
/// Structural mistakes (duplicate nodes, a node with two outgoing edges,
/// dangling targets, unreachable nodes) are collected while building and
/// reported together by [`compile`](Self::compile).
pub struct StateGraph<S> {
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, Arc<dyn Node<S>>>,
    edges: HashMap<NodeId, Edge<S>>,
    entry: Option<NodeId>,
    problems: Vec<String>,
}

impl<S: GraphState> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            problems: Vec::new(),
        }
    }

    /// Add a named node
    pub fn add_node(&mut self, id: impl Into<NodeId>, node: impl Node<S> + 'static) -> &mut Self {
        let id = id.into();
        if id == START || id == END {
            self.problems.push(format!("Node name {} is reserved", id));
        } else if self.nodes.contains_key(&id) {
            self.problems.push(format!("Node {} is defined more than once", id));
        } else {
            self.order.push(id.clone());
            self.nodes.insert(id, Arc::new(node));
        }
        self
    }

    /// Add an unconditional edge
    ///
    /// An edge from [`START`] sets the entry node.
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        let from = from.into();
        let to = to.into();

        if from == START {
            self.set_entry(to);
        } else {
            self.insert_edge(from, Edge::Direct(to));
        }
        self
    }

    /// Add a conditional edge
    ///
    /// `guard` picks a route from the state after `from` has run; `targets`
    /// maps every route to a node name or [`END`].
    pub fn add_conditional_edge<R, G, T>(
        &mut self,
        from: impl Into<NodeId>,
        guard: G,
        targets: T,
    ) -> &mut Self
    where
        R: Route,
        G: Fn(&S) -> R + Send + Sync + 'static,
        T: Fn(R) -> &'static str,
    {
        let from = from.into();
        let branches = R::ALL
            .iter()
            .map(|route| Branch {
                label: route.label(),
                target: targets(*route).to_string(),
            })
            .collect();

        let router = Arc::new(move |state: &S| guard(state).label());
        self.insert_edge(from, Edge::Conditional { router, branches });
        self
    }

    /// Set the first node of every turn
    pub fn set_entry(&mut self, node: impl Into<NodeId>) -> &mut Self {
        let node = node.into();
        if let Some(existing) = &self.entry {
            if *existing != node {
                self.problems
                    .push(format!("Entry point set twice ({} and {})", existing, node));
            }
        }
        self.entry = Some(node);
        self
    }

    fn insert_edge(&mut self, from: NodeId, edge: Edge<S>) {
        if from == END {
            self.problems.push("END cannot have outgoing edges".to_string());
        } else if self.edges.contains_key(&from) {
            self.problems
                .push(format!("Node {} has more than one outgoing edge", from));
        } else {
            self.edges.insert(from, edge);
        }
    }

    /// Validate the structure and produce an immutable graph
    ///
    /// # Errors
    ///
    /// [`GraphError::Validation`] listing every structural problem found.
    pub fn build(self) -> Result<Graph<S>> {
        let mut problems = self.problems;

        let entry = match &self.entry {
            None => {
                problems.push("No entry point: add an edge from START".to_string());
                None
            }
            Some(e) if !self.nodes.contains_key(e) => {
                problems.push(format!("Entry point {} does not exist", e));
                None
            }
            Some(e) => Some(e.clone()),
        };

        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                problems.push(format!("Edge source {} does not exist", from));
            }

            if let Edge::Conditional { branches, .. } = edge {
                if branches.is_empty() {
                    problems.push(format!("Conditional edge from {} has no routes", from));
                }
                let mut labels = HashSet::new();
                for branch in branches {
                    if !labels.insert(branch.label) {
                        problems.push(format!(
                            "Conditional edge from {} repeats route {}",
                            from, branch.label
                        ));
                    }
                }
            }

            for to in edge.targets() {
                if to == START {
                    problems.push(format!("Edge from {} targets START", from));
                } else if to != END && !self.nodes.contains_key(to) {
                    problems.push(format!("Edge target {} (from {}) does not exist", to, from));
                }
            }
        }

        for id in &self.order {
            if !self.edges.contains_key(id) {
                problems.push(format!("Node {} has no outgoing edge", id));
            }
        }

        if let Some(entry) = &entry {
            let reachable = reachable_from(entry, &self.edges);
            for id in &self.order {
                if !reachable.contains(id.as_str()) {
                    problems.push(format!("Node {} is unreachable from {}", id, entry));
                }
            }
        }

        match entry {
            Some(entry) if problems.is_empty() => Ok(Graph {
                order: self.order,
                nodes: self.nodes,
                edges: self.edges,
                entry,
            }),
            _ => Err(GraphError::Validation(problems.join("; "))),
        }
    }

    /// Validate and wrap in an executor with default settings
    ///
    /// Configure persistence, the capability provider and limits with the
    /// `with_*` methods on [`CompiledGraph`].
    pub fn compile(self) -> Result<CompiledGraph<S>> {
        Ok(CompiledGraph::new(self.build()?))
    }
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn reachable_from<'a, S>(entry: &'a str, edges: &'a HashMap<NodeId, Edge<S>>) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([entry]);

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(edge) = edges.get(id) {
            for to in edge.targets() {
                if to != END && !seen.contains(to) {
                    queue.push_back(to);
                }
            }
        }
    }

    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::pure_node;
    use crate::state::{OverwriteReducer, StateSchema};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Flag {
        on: bool,
    }

    #[derive(Serialize)]
    struct FlagUpdate {
        on: bool,
    }

    impl GraphState for Flag {
        type Update = FlagUpdate;
        fn schema() -> StateSchema {
            StateSchema::new().with_field("on", OverwriteReducer)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Switch {
        On,
        Off,
    }

    impl Route for Switch {
        const ALL: &'static [Self] = &[Switch::On, Switch::Off];
        fn label(self) -> &'static str {
            match self {
                Switch::On => "on",
                Switch::Off => "off",
            }
        }
    }

    fn noop() -> impl Node<Flag> {
        pure_node(|s: &Flag| FlagUpdate { on: s.on })
    }

    fn validation_message(builder: StateGraph<Flag>) -> String {
        match builder.build() {
            Err(GraphError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_linear_graph_builds() {
        let mut builder = StateGraph::new();
        builder
            .add_node("a", noop())
            .add_node("b", noop())
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", END);

        let graph = builder.build().unwrap();
        assert_eq!(graph.entry(), "a");
        assert_eq!(graph.node_ids(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_conditional_transition() {
        let mut builder = StateGraph::new();
        builder
            .add_node("check", noop())
            .add_node("lit", noop())
            .add_edge(START, "check")
            .add_conditional_edge(
                "check",
                |s: &Flag| if s.on { Switch::On } else { Switch::Off },
                |r| match r {
                    Switch::On => "lit",
                    Switch::Off => END,
                },
            )
            .add_edge("lit", END);

        let graph = builder.build().unwrap();
        let on = graph.transition("check", &Flag { on: true }).unwrap();
        assert_eq!(on.next, "lit");
        assert_eq!(on.route, Some("on"));

        let off = graph.transition("check", &Flag { on: false }).unwrap();
        assert_eq!(off.next, END);
        assert_eq!(off.route, Some("off"));
    }

    #[test]
    fn test_missing_entry() {
        let mut builder = StateGraph::new();
        builder.add_node("a", noop()).add_edge("a", END);
        assert!(validation_message(builder).contains("No entry point"));
    }

    #[test]
    fn test_dangling_target() {
        let mut builder = StateGraph::new();
        builder
            .add_node("a", noop())
            .add_edge(START, "a")
            .add_edge("a", "ghost");
        assert!(validation_message(builder).contains("ghost"));
    }

    #[test]
    fn test_dangling_branch_target() {
        let mut builder = StateGraph::new();
        builder
            .add_node("a", noop())
            .add_edge(START, "a")
            .add_conditional_edge(
                "a",
                |_: &Flag| Switch::On,
                |r| match r {
                    Switch::On => END,
                    Switch::Off => "nowhere",
                },
            );
        assert!(validation_message(builder).contains("nowhere"));
    }

    #[test]
    fn test_node_without_edge() {
        let mut builder = StateGraph::new();
        builder
            .add_node("a", noop())
            .add_node("b", noop())
            .add_edge(START, "a")
            .add_edge("a", "b");
        assert!(validation_message(builder).contains("Node b has no outgoing edge"));
    }

    #[test]
    fn test_two_outgoing_edges() {
        let mut builder = StateGraph::new();
        builder
            .add_node("a", noop())
            .add_edge(START, "a")
            .add_edge("a", END)
            .add_edge("a", END);
        assert!(validation_message(builder).contains("more than one outgoing edge"));
    }

    #[test]
    fn test_unreachable_node() {
        let mut builder = StateGraph::new();
        builder
            .add_node("a", noop())
            .add_node("island", noop())
            .add_edge(START, "a")
            .add_edge("a", END)
            .add_edge("island", END);
        assert!(validation_message(builder).contains("island is unreachable"));
    }

    #[test]
    fn test_duplicate_and_reserved_nodes() {
        let mut builder = StateGraph::new();
        builder
            .add_node("a", noop())
            .add_node("a", noop())
            .add_node(END, noop())
            .add_edge(START, "a")
            .add_edge("a", END);
        let msg = validation_message(builder);
        assert!(msg.contains("more than once"));
        assert!(msg.contains("reserved"));
    }
}
