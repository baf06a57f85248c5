use super::{ask_json, log_degraded, Assessment, Listing};
use crate::destination::Destination;
use crate::error::StepFailure;
use crate::guards::MIN_VIABLE_OPTIONS;
use crate::prompts;
use crate::state::{TravelState, TravelUpdate};
use async_trait::async_trait;
use tracing::debug;
use tripgraph_core::{Node, NodeContext};

/// Upper bound on candidates kept from one generation
pub const MAX_CANDIDATES: usize = 5;

/// Proposes destinations matching the collected preferences
///
/// On a retry the prompt lists the rejected names and the last feedback so
/// the model moves away from them.
pub struct GenerateCandidates;

impl GenerateCandidates {
    fn clean(raw: Vec<Destination>) -> Vec<Destination> {
        let mut kept: Vec<Destination> = Vec::new();
        for dest in raw.into_iter().filter(Destination::is_named) {
            if !kept.iter().any(|k| k.same_place(&dest.name)) {
                kept.push(dest);
            }
        }
        kept.truncate(MAX_CANDIDATES);
        kept
    }
}

#[async_trait]
impl Node<TravelState> for GenerateCandidates {
    async fn run(&self, state: &TravelState, ctx: &NodeContext) -> TravelUpdate {
        let temperature = if state.retry_count > 0 { 0.9 } else { 0.7 };

        let generated = ask_json::<Listing<Destination>>(ctx, prompts::candidates(state), temperature)
            .await
            .map(|listing| Self::clean(listing.into_vec()))
            .and_then(|list| {
                if list.is_empty() {
                    Err(StepFailure::Empty("no named candidates"))
                } else {
                    Ok(list)
                }
            });

        match generated {
            Ok(candidates) => {
                debug!(
                    thread_id = ctx.thread_id(),
                    count = candidates.len(),
                    attempt = state.retry_count + 1,
                    "Generated candidates"
                );
                TravelUpdate {
                    candidates: Some(candidates),
                    ..Default::default()
                }
            }
            Err(failure) => {
                log_degraded(ctx, &failure);
                TravelUpdate {
                    candidates: Some(Vec::new()),
                    validation_score: Some(0.0),
                    ..Default::default()
                }
                .with_feedback("여행지 후보를 생성하지 못했습니다.")
            }
        }
    }
}

/// Scores how well the candidate set fits the preferences
///
/// A set smaller than the shortlist needs keeps the model's score, but the
/// shortfall is prefixed to the feedback so the next generation sees it.
pub struct ValidateCandidates;

impl ValidateCandidates {
    fn shortfall_note(count: usize) -> Option<String> {
        (count < MIN_VIABLE_OPTIONS).then(|| {
            format!("후보가 {count}곳뿐입니다. {MIN_VIABLE_OPTIONS}곳 이상 제안이 필요합니다.")
        })
    }
}

#[async_trait]
impl Node<TravelState> for ValidateCandidates {
    async fn run(&self, state: &TravelState, ctx: &NodeContext) -> TravelUpdate {
        if state.candidates.is_empty() {
            return TravelUpdate {
                validation_score: Some(0.0),
                ..Default::default()
            }
            .with_feedback("검토할 여행지 후보가 없습니다.");
        }

        let (score, feedback) =
            match ask_json::<Assessment>(ctx, prompts::validate_candidates(state), 0.0).await {
                Ok(verdict) => (
                    verdict.score.unwrap_or(0.0),
                    verdict.feedback.unwrap_or_default(),
                ),
                Err(failure) => {
                    log_degraded(ctx, &failure);
                    (0.0, "후보 검토에 실패했습니다.".to_string())
                }
            };

        let feedback = match Self::shortfall_note(state.candidates.len()) {
            Some(note) if feedback.trim().is_empty() => note,
            Some(note) => format!("{note} {feedback}"),
            None => feedback,
        };

        debug!(
            thread_id = ctx.thread_id(),
            score,
            count = state.candidates.len(),
            "Validated candidates"
        );
        TravelUpdate {
            validation_score: Some(score),
            ..Default::default()
        }
        .with_feedback(feedback)
    }
}

/// Consume one unit of the shared candidate retry budget
pub fn increment_retry(state: &TravelState) -> TravelUpdate {
    TravelUpdate {
        retry_count: Some(state.retry_count + 1),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::test_support::run;

    const FIVE_PLUS: &str = r#"Here you go:
```json
[
  {"name": "제주도", "estimated_cost": 900000},
  {"name": "부산", "estimated_cost": "70만원"},
  {"name": "  "},
  {"name": "강릉"},
  {"name": "제주 도"},
  {"name": "여수"},
  {"name": "통영"},
  {"name": "경주"}
]
```"#;

    #[tokio::test]
    async fn test_generation_is_cleaned_and_capped() {
        let update = run(
            &GenerateCandidates,
            "generate_candidates",
            &TravelState::default(),
            &[("generate_candidates", FIVE_PLUS)],
        )
        .await;

        let names: Vec<_> = update
            .candidates
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["제주도", "부산", "강릉", "여수", "통영"]);
        assert_eq!(update.validation_score, None);
    }

    #[tokio::test]
    async fn test_generation_failure_degrades() {
        let update = run(
            &GenerateCandidates,
            "generate_candidates",
            &TravelState::default(),
            &[("generate_candidates", "[]")],
        )
        .await;

        assert_eq!(update.candidates, Some(vec![]));
        assert_eq!(update.validation_score, Some(0.0));
        assert!(update.messages.is_empty());
    }

    #[tokio::test]
    async fn test_validation_of_empty_set_skips_model() {
        // no scripted reply: a model call would fail with a different feedback
        let update = run(&ValidateCandidates, "validate_candidates", &TravelState::default(), &[]).await;
        assert_eq!(update.validation_score, Some(0.0));
        assert_eq!(update.validation_feedback.as_deref(), Some("검토할 여행지 후보가 없습니다."));
    }

    #[tokio::test]
    async fn test_validation_scores() {
        let state = TravelState {
            candidates: ["제주도", "부산", "강릉"].into_iter().map(Destination::new).collect(),
            ..Default::default()
        };

        let update = run(
            &ValidateCandidates,
            "validate_candidates",
            &state,
            &[("validate_candidates", r#"{"score": 0.85, "feedback": "좋음"}"#)],
        )
        .await;
        assert_eq!(update.validation_score, Some(0.85));
        assert_eq!(update.validation_feedback.as_deref(), Some("좋음"));

        let update = run(&ValidateCandidates, "validate_candidates", &state, &[]).await;
        assert_eq!(update.validation_score, Some(0.0));
    }

    #[tokio::test]
    async fn test_short_candidate_set_is_noted() {
        let state = TravelState {
            candidates: vec![Destination::new("제주도"), Destination::new("부산")],
            ..Default::default()
        };

        let update = run(
            &ValidateCandidates,
            "validate_candidates",
            &state,
            &[("validate_candidates", r#"{"score": 0.9, "feedback": "좋음"}"#)],
        )
        .await;
        assert_eq!(update.validation_score, Some(0.9));
        assert_eq!(
            update.validation_feedback.as_deref(),
            Some("후보가 2곳뿐입니다. 3곳 이상 제안이 필요합니다. 좋음")
        );

        let update = run(
            &ValidateCandidates,
            "validate_candidates",
            &state,
            &[("validate_candidates", r#"{"score": 0.9}"#)],
        )
        .await;
        assert_eq!(
            update.validation_feedback.as_deref(),
            Some("후보가 2곳뿐입니다. 3곳 이상 제안이 필요합니다.")
        );
    }

    #[test]
    fn test_increment_retry() {
        let state = TravelState {
            retry_count: 1,
            ..Default::default()
        };
        assert_eq!(increment_retry(&state).retry_count, Some(2));
    }
}
