use super::selection::SHORTLIST_SIZE;
use crate::destination::Destination;
use crate::state::{TravelState, TravelUpdate};
use std::fmt::Write;

/// Reply when nothing survived filtering and ranking
pub const NO_RESULTS_REPLY: &str = "아쉽게도 말씀하신 조건에 맞는 여행지를 찾지 못했어요. \
예산이나 기간, 관심사를 조금 바꿔서 다시 말씀해 주시겠어요?";

const CLOSING: &str = "더 궁금한 점이나 바꾸고 싶은 조건이 있으면 편하게 말씀해 주세요!";

fn render(index: usize, dest: &Destination) -> String {
    let mut block = format!("{}. {}", index + 1, dest.label());
    if let Some(cost) = dest.cost_label() {
        let _ = write!(block, "\n   - 예상 비용: {cost}");
    }
    if !dest.summary.trim().is_empty() {
        let _ = write!(block, "\n   - 소개: {}", dest.summary.trim());
    }
    if let Some(reason) = &dest.rank_reason {
        let _ = write!(block, "\n   - 추천 이유: {reason}");
    }
    if !dest.highlights.is_empty() {
        let _ = write!(block, "\n   - 특징: {}", dest.highlights.join(", "));
    }
    if let Some(details) = &dest.details {
        if !details.attractions.is_empty() {
            let _ = write!(block, "\n   - 볼거리: {}", details.attractions.join(", "));
        }
        if !details.local_food.is_empty() {
            let _ = write!(block, "\n   - 먹거리: {}", details.local_food.join(", "));
        }
        if let Some(transport) = &details.transport {
            let _ = write!(block, "\n   - 교통: {transport}");
        }
        if let Some(stay) = &details.accommodation {
            let _ = write!(block, "\n   - 숙소: {stay}");
        }
        if !details.tips.is_empty() {
            let _ = write!(block, "\n   - 팁: {}", details.tips.join(", "));
        }
    }
    if let Some(season) = &dest.best_season {
        let _ = write!(block, "\n   - 추천 시기: {season}");
    }
    block
}

/// Format the shortlist as the turn's reply
pub fn present_recommendations(state: &TravelState) -> TravelUpdate {
    let shortlist = &state.final_recommendations;
    if shortlist.is_empty() {
        return TravelUpdate::say(NO_RESULTS_REPLY);
    }

    let prefs = &state.user_preferences;
    let mut reply = if prefs.is_empty() {
        "추천드리는 여행지예요.".to_string()
    } else {
        format!("{} 조건에 맞춰 추천드리는 여행지예요.", prefs.summary())
    };

    for (index, dest) in shortlist.iter().enumerate() {
        reply.push_str("\n\n");
        reply.push_str(&render(index, dest));
    }

    if shortlist.len() < SHORTLIST_SIZE {
        let _ = write!(
            reply,
            "\n\n조건에 맞는 여행지가 {}곳뿐이라 이렇게만 추천드려요.",
            shortlist.len()
        );
    }
    reply.push_str("\n\n");
    reply.push_str(CLOSING);

    TravelUpdate::say(reply)
}
