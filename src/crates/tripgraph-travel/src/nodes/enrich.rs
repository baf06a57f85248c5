use super::{ask_json, log_degraded, Assessment, Listing};
use crate::destination::{Destination, DestinationDetails};
use crate::prompts;
use crate::state::{TravelState, TravelUpdate};
use async_trait::async_trait;
use tracing::debug;
use tripgraph_core::{Node, NodeContext};

/// Adds attractions, food, transport, lodging and tips to each candidate
///
/// Details are matched to candidates by name; a candidate the model skipped
/// keeps whatever it had. If the call fails, the candidates pass through
/// unchanged.
pub struct EnrichInformation;

impl EnrichInformation {
    fn apply(candidates: &[Destination], enriched: &[Destination]) -> Vec<Destination> {
        candidates
            .iter()
            .map(|candidate| {
                let mut merged = candidate.clone();
                if let Some(found) = enriched.iter().find(|e| candidate.same_place(&e.name)) {
                    if found.details.is_some() {
                        merged.details = found.details.clone();
                    }
                    if merged.summary.trim().is_empty() {
                        merged.summary = found.summary.clone();
                    }
                    if merged.highlights.is_empty() {
                        merged.highlights = found.highlights.clone();
                    }
                }
                merged
            })
            .collect()
    }
}

#[async_trait]
impl Node<TravelState> for EnrichInformation {
    async fn run(&self, state: &TravelState, ctx: &NodeContext) -> TravelUpdate {
        let candidates = &state.candidates;
        if candidates.is_empty() {
            return TravelUpdate {
                enriched_data: Some(Vec::new()),
                ..Default::default()
            };
        }

        let enriched = match ask_json::<Listing<Destination>>(ctx, prompts::enrich(candidates), 0.3).await {
            Ok(listing) => Self::apply(candidates, &listing.into_vec()),
            Err(failure) => {
                log_degraded(ctx, &failure);
                candidates.clone()
            }
        };

        debug!(
            thread_id = ctx.thread_id(),
            with_details = enriched.iter().filter(|d| d.details.is_some()).count(),
            total = enriched.len(),
            "Enriched candidates"
        );
        TravelUpdate {
            enriched_data: Some(enriched),
            ..Default::default()
        }
    }
}

/// Share of detail sections filled across all destinations
pub fn coverage_score(destinations: &[Destination]) -> f64 {
    if destinations.is_empty() {
        return 0.0;
    }
    let filled: usize = destinations
        .iter()
        .map(|d| d.details.as_ref().map_or(0, DestinationDetails::filled_sections))
        .sum();
    filled as f64 / (destinations.len() * DestinationDetails::SECTIONS) as f64
}

/// Scores the enriched information; falls back to section coverage when
/// the model gives no score
pub struct ValidateInformation;

#[async_trait]
impl Node<TravelState> for ValidateInformation {
    async fn run(&self, state: &TravelState, ctx: &NodeContext) -> TravelUpdate {
        let enriched = &state.enriched_data;
        if enriched.is_empty() {
            return TravelUpdate {
                info_quality_score: Some(0.0),
                ..Default::default()
            }
            .with_feedback("보강된 여행지 정보가 없습니다.");
        }

        let (score, feedback) =
            match ask_json::<Assessment>(ctx, prompts::validate_information(state), 0.0).await {
                Ok(verdict) => (
                    verdict.score.unwrap_or_else(|| coverage_score(enriched)),
                    verdict.feedback.unwrap_or_default(),
                ),
                Err(failure) => {
                    log_degraded(ctx, &failure);
                    (coverage_score(enriched), "정보 검토에 실패해 항목 충족률로 평가했습니다.".to_string())
                }
            };

        debug!(thread_id = ctx.thread_id(), score, "Validated information");
        TravelUpdate {
            info_quality_score: Some(score),
            ..Default::default()
        }
        .with_feedback(feedback)
    }
}

/// Consume one unit of the enrichment retry budget
pub fn increment_enrich_retry(state: &TravelState) -> TravelUpdate {
    TravelUpdate {
        enrich_retry_count: Some(state.enrich_retry_count + 1),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::test_support::run;

    fn with_candidates(names: &[&str]) -> TravelState {
        TravelState {
            candidates: names.iter().map(|n| Destination::new(*n)).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_details_matched_by_name() {
        let reply = r#"{"destinations": [
            {"name": "jeju", "details": {"attractions": ["성산일출봉"], "local_food": "흑돼지, 고기국수"}},
            {"name": "교토", "details": {"tips": ["이른 아침 방문"]}}
        ]}"#;

        let update = run(
            &EnrichInformation,
            "enrich_information",
            &with_candidates(&["Jeju", "Busan"]),
            &[("enrich_information", reply)],
        )
        .await;

        let enriched = update.enriched_data.unwrap();
        assert_eq!(enriched.len(), 2);
        let jeju = enriched[0].details.as_ref().unwrap();
        assert_eq!(jeju.local_food, vec!["흑돼지", "고기국수"]);
        assert!(enriched[1].details.is_none());
    }

    #[tokio::test]
    async fn test_failure_passes_candidates_through() {
        let state = with_candidates(&["제주도", "부산"]);
        let update = run(&EnrichInformation, "enrich_information", &state, &[]).await;
        assert_eq!(update.enriched_data, Some(state.candidates.clone()));
    }

    #[test]
    fn test_coverage_score() {
        let mut full = Destination::new("a");
        full.details = Some(DestinationDetails {
            attractions: vec!["x".into()],
            local_food: vec!["y".into()],
            transport: Some("bus".into()),
            accommodation: Some("hotel".into()),
            tips: vec!["z".into()],
        });
        let bare = Destination::new("b");

        assert_eq!(coverage_score(&[]), 0.0);
        assert_eq!(coverage_score(&[full.clone()]), 1.0);
        assert_eq!(coverage_score(&[full, bare]), 0.5);
    }

    #[tokio::test]
    async fn test_validation_falls_back_to_coverage() {
        let state = TravelState {
            enriched_data: vec![Destination::new("a")],
            ..Default::default()
        };
        let update = run(&ValidateInformation, "validate_information", &state, &[]).await;
        assert_eq!(update.info_quality_score, Some(0.0));

        let update = run(
            &ValidateInformation,
            "validate_information",
            &state,
            &[("validate_information", r#"{"score": 0.9}"#)],
        )
        .await;
        assert_eq!(update.info_quality_score, Some(0.9));
    }

    #[test]
    fn test_increment_enrich_retry() {
        assert_eq!(
            increment_enrich_retry(&TravelState::default()).enrich_retry_count,
            Some(1)
        );
    }
}
