//! Shared fixtures for the travel workflow tests

#![allow(dead_code)]

use std::sync::Arc;
use tripgraph_checkpoint::{InMemoryStateStore, StateStore};
use tripgraph_core::ExecutionConfig;
use tripgraph_llm::ScriptedChatModel;
use tripgraph_travel::TravelChatService;

pub const RECOMMEND: &str = r#"{"intent": "recommend_travel"}"#;
pub const GENERAL: &str = r#"{"intent": "general_chat"}"#;
pub const IRRELEVANT: &str = r#"{"intent": "irrelevant_chat"}"#;

/// Budget 100만원, 2박 3일, sea and food
pub const FULL_PREFERENCES: &str =
    r#"{"budget": "100만원", "duration": "2박 3일", "interests": ["바다", "맛집"]}"#;

/// Four candidates, all within 120% of a 100만원 budget
pub const FOUR_CANDIDATES: &str = r#"```json
[
  {"name": "제주도", "region": "제주", "summary": "바다와 오름", "estimated_cost": 900000},
  {"name": "부산", "region": "경상남도", "summary": "해운대와 맛집", "estimated_cost": "70만원"},
  {"name": "강릉", "region": "강원도", "summary": "바다와 커피", "estimated_cost": 600000},
  {"name": "여수", "region": "전라남도", "summary": "밤바다", "estimated_cost": 1150000}
]
```"#;

pub const ENRICHMENT: &str = r#"[
  {"name": "제주도", "details": {"attractions": ["성산일출봉"], "local_food": ["흑돼지"], "transport": "렌터카", "accommodation": "해안 펜션", "tips": ["우도 배편 확인"]}},
  {"name": "부산", "details": {"attractions": ["해운대"], "local_food": ["돼지국밥"], "transport": "지하철", "accommodation": "해운대 호텔", "tips": ["주말 혼잡"]}},
  {"name": "강릉", "details": {"attractions": ["경포대"], "local_food": ["초당순두부"], "transport": "KTX", "accommodation": "한옥 스테이", "tips": ["커피거리 방문"]}}
]"#;

pub const RANKING: &str = r#"[
  {"name": "부산", "fit_score": 0.92, "rank_reason": "바다와 맛집을 모두 즐길 수 있음"},
  {"name": "제주도", "fit_score": 0.88, "rank_reason": "자연 경관"},
  {"name": "강릉", "fit_score": 0.8, "rank_reason": "가성비"}
]"#;

pub fn score(value: f64) -> String {
    format!(r#"{{"score": {value}, "feedback": "score {value}"}}"#)
}

/// Model scripted for a turn that goes straight through to a shortlist
pub fn recommending_model() -> ScriptedChatModel {
    ScriptedChatModel::new()
        .with_reply("intent_classifier", RECOMMEND)
        .with_reply("collect_preferences", FULL_PREFERENCES)
        .with_reply("generate_candidates", FOUR_CANDIDATES)
        .with_reply("validate_candidates", score(0.85))
        .with_reply("enrich_information", ENRICHMENT)
        .with_reply("validate_information", score(0.8))
        .with_reply("rank_destinations", RANKING)
}

pub fn service_with(model: Arc<ScriptedChatModel>, store: Arc<dyn StateStore>) -> TravelChatService {
    service_with_config(model, store, ExecutionConfig::default())
}

pub fn service_with_config(
    model: Arc<ScriptedChatModel>,
    store: Arc<dyn StateStore>,
    config: ExecutionConfig,
) -> TravelChatService {
    TravelChatService::new(model, store, config).unwrap()
}

pub fn service(model: Arc<ScriptedChatModel>) -> TravelChatService {
    service_with(model, Arc::new(InMemoryStateStore::new()))
}
