//! Prompt construction for the model-backed nodes
//!
//! Each builder returns the full message list for one call. Structured
//! answers are requested as JSON; the nodes parse them leniently and fall
//! back to degraded defaults when parsing fails.

use crate::destination::Destination;
use crate::preferences::UserPreferences;
use crate::state::TravelState;
use tripgraph_core::messages::transcript;
use tripgraph_core::Message;

/// Messages of recent history included for intent and small talk
const CONTEXT_WINDOW: usize = 6;

const INTENT_SYSTEM: &str = "\
당신은 여행 추천 서비스의 대화 분류기입니다. 마지막 사용자 메시지의 의도를 다음 중 하나로 분류하세요.
- recommend_travel: 여행지 추천을 원하거나, 여행 조건(예산, 기간, 관심사 등)을 알려주는 경우
- general_chat: 인사, 감사, 서비스에 대한 질문 등 가벼운 대화
- irrelevant_chat: 날씨, 정치, 코딩 등 여행과 무관한 주제
반드시 {\"intent\": \"<label>\"} 형식의 JSON만 출력하세요.";

const GENERAL_SYSTEM: &str = "\
당신은 친절한 여행 추천 도우미입니다. 사용자와 짧고 따뜻하게 대화하고, \
여행지를 추천받으려면 예산, 여행 기간, 관심사를 알려달라고 자연스럽게 안내하세요.";

const PREFERENCES_SYSTEM: &str = "\
대화 전체에서 사용자의 여행 조건을 추출하세요. 언급되지 않은 항목은 null로 두세요.
출력 형식(JSON만):
{\"budget\": <원 단위 정수>, \"duration\": \"<기간>\", \"interests\": [\"<관심사>\"], \
\"travel_style\": \"<스타일>\", \"season\": \"<시기>\", \"companion\": \"<동행>\"}";

const CANDIDATES_SYSTEM: &str = "\
당신은 여행 전문가입니다. 사용자 조건에 맞는 여행지 후보를 3~5곳 제안하세요.
출력 형식(JSON 배열만):
[{\"name\": \"<여행지>\", \"region\": \"<지역>\", \"summary\": \"<한 줄 소개>\", \
\"estimated_cost\": <원 단위 총비용>, \"highlights\": [\"<특징>\"], \"best_season\": \"<추천 시기>\"}]";

const VALIDATE_CANDIDATES_SYSTEM: &str = "\
여행지 후보 목록이 사용자 조건(예산, 기간, 관심사)에 얼마나 잘 맞는지 0~1 사이 점수로 평가하세요.
출력 형식(JSON만): {\"score\": <0~1>, \"feedback\": \"<개선할 점>\"}";

const ENRICH_SYSTEM: &str = "\
각 여행지에 대해 여행자에게 필요한 정보를 보강하세요.
출력 형식(JSON 배열만):
[{\"name\": \"<여행지>\", \"details\": {\"attractions\": [\"<명소>\"], \"local_food\": [\"<음식>\"], \
\"transport\": \"<교통>\", \"accommodation\": \"<숙소>\", \"tips\": [\"<팁>\"]}}]";

const VALIDATE_INFO_SYSTEM: &str = "\
보강된 여행지 정보가 충분하고 구체적인지 0~1 사이 점수로 평가하세요.
출력 형식(JSON만): {\"score\": <0~1>, \"feedback\": \"<부족한 점>\"}";

const RANK_SYSTEM: &str = "\
사용자 조건에 가장 잘 맞는 순서대로 여행지를 최대 3곳 고르세요. 목록에 있는 이름만 사용하세요.
출력 형식(JSON 배열만):
[{\"name\": \"<여행지>\", \"fit_score\": <0~1>, \"rank_reason\": \"<추천 이유>\"}]";

fn recent(messages: &[Message]) -> &[Message] {
    &messages[messages.len().saturating_sub(CONTEXT_WINDOW)..]
}

fn preferences_json(prefs: &UserPreferences) -> String {
    serde_json::to_string(prefs).unwrap_or_else(|_| "{}".to_string())
}

fn destinations_json(destinations: &[Destination]) -> String {
    serde_json::to_string_pretty(destinations).unwrap_or_else(|_| "[]".to_string())
}

pub fn intent(state: &TravelState) -> Vec<Message> {
    vec![
        Message::system(INTENT_SYSTEM),
        Message::human(format!("대화:\n{}", transcript(recent(&state.messages)))),
    ]
}

pub fn general_chat(state: &TravelState) -> Vec<Message> {
    let mut messages = vec![Message::system(GENERAL_SYSTEM)];
    messages.extend(recent(&state.messages).iter().cloned());
    messages
}

pub fn preferences(state: &TravelState) -> Vec<Message> {
    vec![
        Message::system(PREFERENCES_SYSTEM),
        Message::human(format!(
            "지금까지 파악된 조건: {}\n\n대화:\n{}",
            preferences_json(&state.user_preferences),
            transcript(&state.messages)
        )),
    ]
}

pub fn candidates(state: &TravelState) -> Vec<Message> {
    let mut request = format!(
        "사용자 조건: {}",
        preferences_json(&state.user_preferences)
    );

    if state.retry_count > 0 {
        let previous: Vec<&str> = state
            .candidates
            .iter()
            .filter(|d| d.is_named())
            .map(|d| d.name.as_str())
            .collect();
        if !previous.is_empty() {
            request.push_str(&format!(
                "\n\n이전에 제안했지만 적합하지 않았던 후보(다시 제안하지 마세요): {}",
                previous.join(", ")
            ));
        }
        if !state.validation_feedback.trim().is_empty() {
            request.push_str(&format!("\n이전 평가 피드백: {}", state.validation_feedback));
        }
    }

    vec![Message::system(CANDIDATES_SYSTEM), Message::human(request)]
}

pub fn validate_candidates(state: &TravelState) -> Vec<Message> {
    vec![
        Message::system(VALIDATE_CANDIDATES_SYSTEM),
        Message::human(format!(
            "사용자 조건: {}\n\n후보:\n{}",
            preferences_json(&state.user_preferences),
            destinations_json(&state.candidates)
        )),
    ]
}

pub fn enrich(candidates: &[Destination]) -> Vec<Message> {
    vec![
        Message::system(ENRICH_SYSTEM),
        Message::human(format!("여행지:\n{}", destinations_json(candidates))),
    ]
}

pub fn validate_information(state: &TravelState) -> Vec<Message> {
    vec![
        Message::system(VALIDATE_INFO_SYSTEM),
        Message::human(format!(
            "여행지 정보:\n{}",
            destinations_json(&state.enriched_data)
        )),
    ]
}

pub fn rank(state: &TravelState) -> Vec<Message> {
    vec![
        Message::system(RANK_SYSTEM),
        Message::human(format!(
            "사용자 조건: {}\n\n여행지:\n{}",
            preferences_json(&state.user_preferences),
            destinations_json(&state.filtered_options)
        )),
    ]
}
