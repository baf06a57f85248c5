use super::{ask_json, log_degraded, Listing};
use crate::destination::Destination;
use crate::guards::MIN_VIABLE_OPTIONS;
use crate::preferences::{format_krw, UserPreferences};
use crate::prompts;
use crate::state::{TravelState, TravelUpdate};
use async_trait::async_trait;
use tracing::debug;
use tripgraph_core::{Node, NodeContext};

/// Size of the final shortlist
pub const SHORTLIST_SIZE: usize = 3;

/// Drop destinations whose estimated cost exceeds 120% of the budget
///
/// Works on the enriched data when there is any, otherwise on the raw
/// candidates. When too few survive, the reason is left in the feedback
/// for the next generation attempt.
pub fn filter_options(state: &TravelState) -> TravelUpdate {
    let source = if state.enriched_data.is_empty() {
        &state.candidates
    } else {
        &state.enriched_data
    };
    let budget = state.user_preferences.budget;

    let kept: Vec<Destination> = source
        .iter()
        .filter(|d| d.is_named() && d.within_budget(budget))
        .cloned()
        .collect();

    debug!(kept = kept.len(), dropped = source.len() - kept.len(), "Filtered options");

    let mut update = TravelUpdate::default();
    if kept.len() < MIN_VIABLE_OPTIONS {
        let limit = budget
            .map(|b| format!("예산 {}의 120% 이내", format_krw(b)))
            .unwrap_or_else(|| "조건에 맞는".to_string());
        update = update.with_feedback(format!(
            "{limit} 후보가 {}곳뿐입니다. 더 저렴하거나 다른 여행지를 제안해 주세요.",
            kept.len()
        ));
    }
    update.filtered_options = Some(kept);
    update
}

/// Picks and orders the best three of the filtered options
pub struct RankDestinations;

impl RankDestinations {
    /// Map the model's ranking back onto the known options, ignoring names
    /// that are not among them
    fn apply(options: &[Destination], ranked: Vec<Destination>) -> Vec<Destination> {
        let mut picked: Vec<Destination> = Vec::new();
        for entry in ranked {
            let Some(option) = options.iter().find(|o| o.same_place(&entry.name)) else {
                continue;
            };
            if picked.iter().any(|p| p.same_place(&option.name)) {
                continue;
            }
            let mut chosen = option.clone();
            chosen.fit_score = entry.fit_score.or(chosen.fit_score);
            chosen.rank_reason = entry.rank_reason.or(chosen.rank_reason);
            picked.push(chosen);
            if picked.len() == SHORTLIST_SIZE {
                break;
            }
        }
        picked
    }

    /// Order by how many interests a destination mentions, keeping the
    /// original order among ties
    pub fn heuristic(options: &[Destination], prefs: &UserPreferences) -> Vec<Destination> {
        let interests: Vec<String> = prefs
            .interests
            .iter()
            .map(|i| i.trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect();

        let mut scored: Vec<(usize, Destination)> = options
            .iter()
            .map(|dest| {
                let haystack = describe(dest).to_lowercase();
                let hits = interests.iter().filter(|i| haystack.contains(i.as_str())).count();
                let mut dest = dest.clone();
                if !interests.is_empty() {
                    dest.fit_score = Some(hits as f64 / interests.len() as f64);
                }
                (hits, dest)
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .map(|(_, dest)| dest)
            .take(SHORTLIST_SIZE)
            .collect()
    }
}

fn describe(dest: &Destination) -> String {
    let mut text = format!("{} {} {} {}", dest.name, dest.region, dest.summary, dest.highlights.join(" "));
    if let Some(details) = &dest.details {
        text.push(' ');
        text.push_str(&details.attractions.join(" "));
        text.push(' ');
        text.push_str(&details.local_food.join(" "));
    }
    text
}

#[async_trait]
impl Node<TravelState> for RankDestinations {
    async fn run(&self, state: &TravelState, ctx: &NodeContext) -> TravelUpdate {
        let options = &state.filtered_options;
        if options.is_empty() {
            return TravelUpdate {
                final_recommendations: Some(Vec::new()),
                ..Default::default()
            };
        }

        let ranked = match ask_json::<Listing<Destination>>(ctx, prompts::rank(state), 0.2).await {
            Ok(listing) => Self::apply(options, listing.into_vec()),
            Err(failure) => {
                log_degraded(ctx, &failure);
                Vec::new()
            }
        };

        let shortlist = if ranked.is_empty() {
            Self::heuristic(options, &state.user_preferences)
        } else {
            ranked
        };

        debug!(
            thread_id = ctx.thread_id(),
            names = ?shortlist.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            "Ranked destinations"
        );
        TravelUpdate {
            final_recommendations: Some(shortlist),
            ..Default::default()
        }
    }
}

/// Sanity pass over the shortlist; records a note but never blocks
pub fn final_check(state: &TravelState) -> TravelUpdate {
    let shortlist = &state.final_recommendations;
    let over_budget = shortlist
        .iter()
        .filter(|d| !d.within_budget(state.user_preferences.budget))
        .count();

    let note = match shortlist.len() {
        0 => "추천 가능한 여행지가 없습니다.".to_string(),
        n if n < SHORTLIST_SIZE => format!("조건에 맞는 여행지가 {n}곳뿐입니다."),
        n => format!("최종 추천 {n}곳 확인 완료"),
    };
    let note = if over_budget > 0 {
        format!("{note} (예산 초과 {over_budget}곳)")
    } else {
        note
    };

    debug!(count = shortlist.len(), over_budget, "Final check");
    TravelUpdate::default().with_feedback(note)
}
