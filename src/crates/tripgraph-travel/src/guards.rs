//! Routing decisions for the travel workflow
//!
//! Every guard is a pure function of the post-merge state returning a
//! closed [`Route`] enum. The guards that can re-enter a retry loop check
//! the counter against `max_retries` before choosing the loop, so each
//! loop is taken at most `max_retries` times per turn.

use crate::state::{Intent, TravelState};
use tripgraph_core::Route;

/// Candidate sets scoring below this are regenerated
pub const CANDIDATE_QUALITY_THRESHOLD: f64 = 0.7;

/// Enrichment scoring below this is redone
pub const INFO_QUALITY_THRESHOLD: f64 = 0.6;

/// Fewer filtered options than this triggers regeneration
pub const MIN_VIABLE_OPTIONS: usize = 3;

macro_rules! route_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl Route for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

route_enum! {
    /// Outcome of the intent router
    IntentRoute {
        Recommend => "recommend_travel",
        General => "general_chat",
        Irrelevant => "irrelevant_chat",
    }
}

route_enum! {
    /// Outcome of the info-sufficiency guard
    InfoSufficiency {
        Generate => "generate",
        AskMore => "ask_more",
    }
}

route_enum! {
    /// Outcome of the candidate-quality guard
    CandidateQuality {
        Proceed => "proceed",
        Regenerate => "regenerate",
        Recollect => "recollect",
    }
}

route_enum! {
    /// Outcome of the info-quality guard
    InfoQuality {
        Proceed => "proceed",
        Reenrich => "reenrich",
        ProceedDegraded => "proceed_degraded",
    }
}

route_enum! {
    /// Outcome of the viable-options guard
    Viability {
        Rank => "rank",
        Regenerate => "regenerate",
        RankDegraded => "rank_degraded",
    }
}

/// Route on the classified intent; an unclassified turn is small talk
pub fn route_intent(state: &TravelState) -> IntentRoute {
    match state.intent {
        Some(Intent::RecommendTravel) => IntentRoute::Recommend,
        Some(Intent::IrrelevantChat) => IntentRoute::Irrelevant,
        Some(Intent::GeneralChat) | None => IntentRoute::General,
    }
}

/// Generate only when budget, duration and interests are all known
///
/// Also ends the turn when candidate retries are already exhausted: the
/// user is being asked to revise their preferences, and generating again
/// in the same turn could not change the outcome.
pub fn check_info_sufficiency(state: &TravelState) -> InfoSufficiency {
    if !state.user_preferences.is_sufficient() || !state.retries_remain() {
        InfoSufficiency::AskMore
    } else {
        InfoSufficiency::Generate
    }
}

pub fn check_candidate_quality(state: &TravelState) -> CandidateQuality {
    if state.validation_score >= CANDIDATE_QUALITY_THRESHOLD {
        CandidateQuality::Proceed
    } else if state.retries_remain() {
        CandidateQuality::Regenerate
    } else {
        CandidateQuality::Recollect
    }
}

pub fn check_info_quality(state: &TravelState) -> InfoQuality {
    if state.info_quality_score >= INFO_QUALITY_THRESHOLD {
        InfoQuality::Proceed
    } else if state.enrich_retries_remain() {
        InfoQuality::Reenrich
    } else {
        InfoQuality::ProceedDegraded
    }
}

pub fn check_viable_options(state: &TravelState) -> Viability {
    if state.filtered_options.len() >= MIN_VIABLE_OPTIONS {
        Viability::Rank
    } else if state.retries_remain() {
        Viability::Regenerate
    } else {
        Viability::RankDegraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::Destination;
    use crate::preferences::UserPreferences;
    use crate::state::MAX_RETRIES;

    fn complete_preferences() -> UserPreferences {
        UserPreferences {
            budget: Some(1_000_000),
            duration: Some("2박 3일".into()),
            interests: vec!["바다".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_route_intent() {
        let mut state = TravelState::default();
        assert_eq!(route_intent(&state), IntentRoute::General);

        state.intent = Some(Intent::RecommendTravel);
        assert_eq!(route_intent(&state), IntentRoute::Recommend);

        state.intent = Some(Intent::IrrelevantChat);
        assert_eq!(route_intent(&state), IntentRoute::Irrelevant);
    }

    #[test]
    fn test_info_sufficiency() {
        let mut state = TravelState::default();
        assert_eq!(check_info_sufficiency(&state), InfoSufficiency::AskMore);

        state.user_preferences = complete_preferences();
        assert_eq!(check_info_sufficiency(&state), InfoSufficiency::Generate);

        state.user_preferences.budget = Some(0);
        assert_eq!(check_info_sufficiency(&state), InfoSufficiency::AskMore);
    }

    #[test]
    fn test_info_sufficiency_after_exhausted_retries() {
        let state = TravelState {
            user_preferences: complete_preferences(),
            retry_count: MAX_RETRIES,
            ..Default::default()
        };
        assert_eq!(check_info_sufficiency(&state), InfoSufficiency::AskMore);
    }

    #[test]
    fn test_candidate_quality() {
        let mut state = TravelState {
            validation_score: 0.7,
            ..Default::default()
        };
        assert_eq!(check_candidate_quality(&state), CandidateQuality::Proceed);

        state.validation_score = 0.69;
        assert_eq!(check_candidate_quality(&state), CandidateQuality::Regenerate);

        state.retry_count = 1;
        assert_eq!(check_candidate_quality(&state), CandidateQuality::Regenerate);

        state.retry_count = 2;
        assert_eq!(check_candidate_quality(&state), CandidateQuality::Recollect);
    }

    #[test]
    fn test_info_quality() {
        let mut state = TravelState {
            info_quality_score: 0.6,
            ..Default::default()
        };
        assert_eq!(check_info_quality(&state), InfoQuality::Proceed);

        state.info_quality_score = 0.2;
        assert_eq!(check_info_quality(&state), InfoQuality::Reenrich);

        state.enrich_retry_count = 2;
        assert_eq!(check_info_quality(&state), InfoQuality::ProceedDegraded);
    }

    #[test]
    fn test_viable_options() {
        let mut state = TravelState {
            filtered_options: vec![Destination::new("a"), Destination::new("b"), Destination::new("c")],
            ..Default::default()
        };
        assert_eq!(check_viable_options(&state), Viability::Rank);

        state.filtered_options.truncate(1);
        assert_eq!(check_viable_options(&state), Viability::Regenerate);

        state.retry_count = state.max_retries;
        assert_eq!(check_viable_options(&state), Viability::RankDegraded);
    }

    #[test]
    fn test_route_labels_are_distinct() {
        let labels: Vec<_> = Viability::ALL.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["rank", "regenerate", "rank_degraded"]);
        assert_eq!(IntentRoute::ALL.len(), 3);
    }
}
