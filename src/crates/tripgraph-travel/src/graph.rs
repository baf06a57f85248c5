//! Assembly of the travel recommendation graph
//!
//! ```text
//! intent_classifier ─┬─ general_chat ──────────────────────────────► END
//!                    ├─ irrelevant_chat ───────────────────────────► END
//!                    └─ collect_preferences ─┬─ (ask more) ────────► END
//!                                            └─ generate_candidates
//! generate_candidates → validate_candidates ─┬─ enrich_information
//!                                            ├─ increment_retry → generate_candidates
//!                                            └─ collect_preferences
//! enrich_information → validate_information ─┬─ filter_options
//!                                            └─ increment_enrich_retry → enrich_information
//! filter_options ─┬─ rank_destinations → final_check → present_recommendations → END
//!                 └─ increment_retry → generate_candidates
//! ```
//!
//! Every cycle passes through `increment_retry` or `increment_enrich_retry`,
//! and the guard in front of each is bounded by `max_retries`.

use crate::guards::{
    check_candidate_quality, check_info_quality, check_info_sufficiency, check_viable_options,
    route_intent, CandidateQuality, InfoQuality, InfoSufficiency, IntentRoute, Viability,
};
use crate::nodes::{
    filter_options, final_check, increment_enrich_retry, increment_retry, irrelevant_chat,
    present_recommendations, CollectPreferences, EnrichInformation, GeneralChat,
    GenerateCandidates, IntentClassifier, RankDestinations, ValidateCandidates,
    ValidateInformation,
};
use crate::state::TravelState;
use tripgraph_core::{pure_node, CompiledGraph, StateGraph, END, START};

pub const INTENT_CLASSIFIER: &str = "intent_classifier";
pub const GENERAL_CHAT: &str = "general_chat";
pub const IRRELEVANT_CHAT: &str = "irrelevant_chat";
pub const COLLECT_PREFERENCES: &str = "collect_preferences";
pub const GENERATE_CANDIDATES: &str = "generate_candidates";
pub const VALIDATE_CANDIDATES: &str = "validate_candidates";
pub const INCREMENT_RETRY: &str = "increment_retry";
pub const ENRICH_INFORMATION: &str = "enrich_information";
pub const VALIDATE_INFORMATION: &str = "validate_information";
pub const INCREMENT_ENRICH_RETRY: &str = "increment_enrich_retry";
pub const FILTER_OPTIONS: &str = "filter_options";
pub const RANK_DESTINATIONS: &str = "rank_destinations";
pub const FINAL_CHECK: &str = "final_check";
pub const PRESENT_RECOMMENDATIONS: &str = "present_recommendations";

/// Declare the travel workflow
pub fn travel_graph() -> StateGraph<TravelState> {
    let mut builder = StateGraph::new();

    builder
        .add_node(INTENT_CLASSIFIER, IntentClassifier)
        .add_node(GENERAL_CHAT, GeneralChat)
        .add_node(IRRELEVANT_CHAT, pure_node::<TravelState, _>(irrelevant_chat))
        .add_node(COLLECT_PREFERENCES, CollectPreferences)
        .add_node(GENERATE_CANDIDATES, GenerateCandidates)
        .add_node(VALIDATE_CANDIDATES, ValidateCandidates)
        .add_node(INCREMENT_RETRY, pure_node::<TravelState, _>(increment_retry))
        .add_node(ENRICH_INFORMATION, EnrichInformation)
        .add_node(VALIDATE_INFORMATION, ValidateInformation)
        .add_node(
            INCREMENT_ENRICH_RETRY,
            pure_node::<TravelState, _>(increment_enrich_retry),
        )
        .add_node(FILTER_OPTIONS, pure_node::<TravelState, _>(filter_options))
        .add_node(RANK_DESTINATIONS, RankDestinations)
        .add_node(FINAL_CHECK, pure_node::<TravelState, _>(final_check))
        .add_node(
            PRESENT_RECOMMENDATIONS,
            pure_node::<TravelState, _>(present_recommendations),
        );

    builder
        .add_edge(START, INTENT_CLASSIFIER)
        .add_conditional_edge(INTENT_CLASSIFIER, route_intent, |route| match route {
            IntentRoute::Recommend => COLLECT_PREFERENCES,
            IntentRoute::General => GENERAL_CHAT,
            IntentRoute::Irrelevant => IRRELEVANT_CHAT,
        })
        .add_edge(GENERAL_CHAT, END)
        .add_edge(IRRELEVANT_CHAT, END)
        .add_conditional_edge(COLLECT_PREFERENCES, check_info_sufficiency, |route| match route {
            InfoSufficiency::Generate => GENERATE_CANDIDATES,
            InfoSufficiency::AskMore => END,
        })
        .add_edge(GENERATE_CANDIDATES, VALIDATE_CANDIDATES)
        .add_conditional_edge(VALIDATE_CANDIDATES, check_candidate_quality, |route| match route {
            CandidateQuality::Proceed => ENRICH_INFORMATION,
            CandidateQuality::Regenerate => INCREMENT_RETRY,
            CandidateQuality::Recollect => COLLECT_PREFERENCES,
        })
        .add_edge(INCREMENT_RETRY, GENERATE_CANDIDATES)
        .add_edge(ENRICH_INFORMATION, VALIDATE_INFORMATION)
        .add_conditional_edge(VALIDATE_INFORMATION, check_info_quality, |route| match route {
            InfoQuality::Proceed | InfoQuality::ProceedDegraded => FILTER_OPTIONS,
            InfoQuality::Reenrich => INCREMENT_ENRICH_RETRY,
        })
        .add_edge(INCREMENT_ENRICH_RETRY, ENRICH_INFORMATION)
        .add_conditional_edge(FILTER_OPTIONS, check_viable_options, |route| match route {
            Viability::Rank | Viability::RankDegraded => RANK_DESTINATIONS,
            Viability::Regenerate => INCREMENT_RETRY,
        })
        .add_edge(RANK_DESTINATIONS, FINAL_CHECK)
        .add_edge(FINAL_CHECK, PRESENT_RECOMMENDATIONS)
        .add_edge(PRESENT_RECOMMENDATIONS, END);

    builder
}

/// Declare and validate the travel workflow
pub fn build_travel_graph() -> tripgraph_core::Result<CompiledGraph<TravelState>> {
    travel_graph().compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripgraph_core::Edge;

    #[test]
    fn test_graph_compiles() {
        let graph = build_travel_graph().unwrap();
        assert_eq!(graph.graph().entry(), INTENT_CLASSIFIER);
        assert_eq!(graph.graph().node_ids().len(), 14);
    }

    #[test]
    fn test_cycles_go_through_counters() {
        let graph = build_travel_graph().unwrap();
        let graph = graph.graph();

        let into_generate: Vec<&str> = graph
            .node_ids()
            .iter()
            .filter(|id| {
                graph
                    .edge(id)
                    .is_some_and(|edge| edge.targets().contains(&GENERATE_CANDIDATES))
            })
            .map(String::as_str)
            .collect();
        assert_eq!(into_generate, vec![COLLECT_PREFERENCES, INCREMENT_RETRY]);

        match graph.edge(INCREMENT_ENRICH_RETRY) {
            Some(Edge::Direct(target)) => assert_eq!(target, ENRICH_INFORMATION),
            _ => panic!("increment_enrich_retry must lead straight back to enrichment"),
        }
    }

    #[test]
    fn test_mermaid_lists_routes() {
        let mermaid = build_travel_graph().unwrap().draw_mermaid();
        assert!(mermaid.starts_with("graph TD"));
        assert!(mermaid.contains("validate_candidates -.\"regenerate\".-> increment_retry"));
        assert!(mermaid.contains("filter_options -.\"rank_degraded\".-> rank_destinations"));
    }
}
