//! Graph visualization
//!
//! Renders a [`Graph`] as a Mermaid flowchart. Direct edges are solid
//! arrows; conditional edges are dashed arrows labelled with the route name.
//! Nodes with a conditional outgoing edge are drawn as diamonds.
//!
//! ```text
//! graph TD
//!     start((START))
//!     END_((END))
//!     classify{"classify"}
//!     reply["reply"]
//!     start --> classify
//!     classify -."chat".-> reply
//!     reply --> END_
//! ```

use crate::graph::{Edge, Graph, END, START};
use crate::state::GraphState;

/// Render `graph` as a Mermaid `graph TD` flowchart
pub fn draw_mermaid<S: GraphState>(graph: &Graph<S>) -> String {
    let mut output = String::new();

    output.push_str("graph TD\n");

    output.push_str(&format!("    {}((START))\n", sanitize_id(START)));
    output.push_str(&format!(
        "    style {} fill:#90EE90,stroke:#228B22,stroke-width:3px\n",
        sanitize_id(START)
    ));
    output.push_str(&format!("    {}((END))\n", sanitize_id(END)));
    output.push_str(&format!(
        "    style {} fill:#FFB6C1,stroke:#DC143C,stroke-width:3px\n",
        sanitize_id(END)
    ));

    for node_id in graph.node_ids() {
        let conditional = graph.edge(node_id).is_some_and(|e| e.is_conditional());
        let (open, close) = if conditional { ("{", "}") } else { ("[", "]") };

        output.push_str(&format!(
            "    {}{}\"{}\"{}\n",
            sanitize_id(node_id),
            open,
            escape_mermaid(node_id),
            close
        ));
        if conditional {
            output.push_str(&format!(
                "    style {} fill:#FFE4B5,stroke:#FF8C00,stroke-width:2px\n",
                sanitize_id(node_id)
            ));
        }
    }

    output.push_str(&format!(
        "    {} --> {}\n",
        sanitize_id(START),
        sanitize_id(graph.entry())
    ));

    for from in graph.node_ids() {
        match graph.edge(from) {
            Some(Edge::Direct(to)) => {
                output.push_str(&format!("    {} --> {}\n", sanitize_id(from), sanitize_id(to)));
            }
            Some(Edge::Conditional { branches, .. }) => {
                for branch in branches {
                    output.push_str(&format!(
                        "    {} -.\"{}\".-> {}\n",
                        sanitize_id(from),
                        escape_mermaid(branch.label),
                        sanitize_id(&branch.target)
                    ));
                }
            }
            None => {}
        }
    }

    output
}

/// Escape special characters for Mermaid labels
fn escape_mermaid(s: &str) -> String {
    s.replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Sanitize node IDs for Mermaid (alphanumeric and underscore)
fn sanitize_id(s: &str) -> String {
    let trimmed = s.trim_matches('_');
    let id: String = trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    // "end" is a Mermaid keyword
    if id == "end" {
        "END_".to_string()
    } else {
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateGraph;
    use crate::graph::Route;
    use crate::node::pure_node;
    use crate::state::{OverwriteReducer, StateSchema};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Default, Serialize, Deserialize)]
    struct Doc {
        ok: bool,
    }

    #[derive(Serialize)]
    struct DocUpdate {
        ok: bool,
    }

    impl GraphState for Doc {
        type Update = DocUpdate;
        fn schema() -> StateSchema {
            StateSchema::new().with_field("ok", OverwriteReducer)
        }
    }

    #[derive(Clone, Copy)]
    enum Verdict {
        Pass,
        Fail,
    }

    impl Route for Verdict {
        const ALL: &'static [Self] = &[Verdict::Pass, Verdict::Fail];
        fn label(self) -> &'static str {
            match self {
                Verdict::Pass => "pass",
                Verdict::Fail => "fail",
            }
        }
    }

    fn sample() -> Graph<Doc> {
        let mut builder = StateGraph::new();
        builder
            .add_node("check", pure_node(|s: &Doc| DocUpdate { ok: s.ok }))
            .add_node("fix-up", pure_node(|_: &Doc| DocUpdate { ok: true }))
            .add_edge(START, "check")
            .add_conditional_edge(
                "check",
                |s: &Doc| if s.ok { Verdict::Pass } else { Verdict::Fail },
                |v| match v {
                    Verdict::Pass => END,
                    Verdict::Fail => "fix-up",
                },
            )
            .add_edge("fix-up", "check");
        builder.build().unwrap()
    }

    #[test]
    fn test_mermaid_contains_nodes_and_edges() {
        let mermaid = draw_mermaid(&sample());

        assert!(mermaid.starts_with("graph TD\n"));
        assert!(mermaid.contains("start((START))"));
        assert!(mermaid.contains("END_((END))"));
        assert!(mermaid.contains("start --> check"));
        assert!(mermaid.contains("check{\"check\"}"));
        assert!(mermaid.contains("fix_up[\"fix-up\"]"));
        assert!(mermaid.contains("check -.\"pass\".-> END_"));
        assert!(mermaid.contains("check -.\"fail\".-> fix_up"));
        assert!(mermaid.contains("fix_up --> check"));
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("__start__"), "start");
        assert_eq!(sanitize_id("__end__"), "END_");
        assert_eq!(sanitize_id("a.b-c"), "a_b_c");
    }

    #[test]
    fn test_escape_mermaid() {
        assert_eq!(escape_mermaid("a<\"b\">"), "a&lt;&quot;b&quot;&gt;");
    }
}
