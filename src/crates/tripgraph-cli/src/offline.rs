//! Rule-based chat model for running without a provider
//!
//! Answers each workflow task from keyword rules and a small built-in
//! catalog of Korean destinations. Quality is modest, but every reply has
//! the shape the travel nodes expect, so `--offline` exercises the whole
//! graph, including its cycles and persistence.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use tripgraph_core::llm::{CapabilityError, CapabilityResult, ChatModel, ChatRequest, ChatResponse};
use tripgraph_core::{Message, MessageRole};
use tripgraph_travel::graph::{
    COLLECT_PREFERENCES, ENRICH_INFORMATION, GENERAL_CHAT, GENERATE_CANDIDATES, INTENT_CLASSIFIER,
    RANK_DESTINATIONS, VALIDATE_CANDIDATES, VALIDATE_INFORMATION,
};
use tripgraph_travel::lenient::parse_amount;
use tripgraph_travel::{Destination, UserPreferences};

/// Score given by both validation tasks
pub const OFFLINE_SCORE: f64 = 0.8;

const MAX_SUGGESTIONS: usize = 5;

const GREETING: &str = "안녕하세요! 오프라인 여행 도우미예요. \
예산, 여행 기간, 관심사를 알려주시면 국내 여행지를 추천해 드릴게요.";

const TRAVEL_KEYWORDS: &[&str] = &["여행", "추천", "예산", "휴가", "놀러", "가볼", "떠나"];

const OFF_TOPIC_KEYWORDS: &[&str] = &["날씨", "주식", "코딩", "정치", "뉴스", "환율", "게임", "숙제"];

const INTEREST_KEYWORDS: &[&str] = &[
    "바다", "해변", "등산", "맛집", "음식", "온천", "역사", "문화", "자연", "쇼핑", "카페", "야경",
    "축제", "캠핑", "힐링",
];

const COMPANIONS: &[&str] = &["가족", "친구", "연인", "부모님", "아이", "혼자"];

static BUDGET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d[\d,]*(?:\.\d+)?\s*(?:억|천만|백만|만|천)\s*원?|\d[\d,]*\s*원").unwrap()
});

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\s*박\s*\d+\s*일|당일치기|\d+\s*주일?|\d+\s*일").unwrap()
});

static SEASON_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}\s*월|봄|여름|가을|겨울").unwrap());

const CATALOG_JSON: &str = r#"[
  {"name": "제주도", "region": "제주특별자치도", "summary": "푸른 바다와 오름, 흑돼지가 있는 섬 여행",
   "estimated_cost": 900000, "highlights": ["바다", "자연", "맛집", "힐링"], "best_season": "4~6월",
   "details": {"attractions": ["성산일출봉", "협재 해수욕장", "사려니숲길"], "local_food": ["흑돼지", "고기국수"],
               "transport": "항공 후 렌터카", "accommodation": "애월 해안가 펜션", "tips": ["렌터카는 미리 예약하세요"]}},
  {"name": "부산", "region": "부산광역시", "summary": "해변과 시장, 야경을 한 번에 즐기는 항구 도시",
   "estimated_cost": 600000, "highlights": ["바다", "맛집", "야경", "쇼핑"], "best_season": "6~9월",
   "details": {"attractions": ["해운대", "감천문화마을", "광안대교"], "local_food": ["돼지국밥", "밀면"],
               "transport": "KTX 후 지하철", "accommodation": "해운대 인근 호텔", "tips": ["광안리 야경은 밤 9시 이후가 좋아요"]}},
  {"name": "강릉", "region": "강원도", "summary": "커피 거리와 동해 바다가 있는 휴식형 여행지",
   "estimated_cost": 500000, "highlights": ["바다", "카페", "힐링"], "best_season": "7~8월",
   "details": {"attractions": ["안목해변", "경포대", "오죽헌"], "local_food": ["초당순두부", "장칼국수"],
               "transport": "KTX 강릉선", "accommodation": "경포 해변 리조트", "tips": ["주말 커피거리는 붐벼요"]}},
  {"name": "경주", "region": "경상북도", "summary": "천년 고도의 유적과 한옥 거리",
   "estimated_cost": 450000, "highlights": ["역사", "문화", "야경"], "best_season": "3~5월",
   "details": {"attractions": ["불국사", "동궁과 월지", "황리단길"], "local_food": ["황남빵", "쌈밥"],
               "transport": "KTX 신경주역 후 버스", "accommodation": "한옥 스테이", "tips": ["자전거로 유적지를 돌아보세요"]}},
  {"name": "여수", "region": "전라남도", "summary": "밤바다와 해산물이 유명한 남해안 도시",
   "estimated_cost": 550000, "highlights": ["바다", "야경", "맛집"], "best_season": "4~10월",
   "details": {"attractions": ["오동도", "여수 해상케이블카", "향일암"], "local_food": ["게장백반", "갓김치"],
               "transport": "KTX 여수엑스포역", "accommodation": "돌산 오션뷰 호텔", "tips": ["케이블카는 해 질 녘이 좋아요"]}},
  {"name": "전주", "region": "전라북도", "summary": "한옥마을과 전통 음식의 도시",
   "estimated_cost": 350000, "highlights": ["맛집", "문화", "역사"], "best_season": "9~11월",
   "details": {"attractions": ["전주 한옥마을", "경기전", "남부시장 야시장"], "local_food": ["비빔밥", "콩나물국밥"],
               "transport": "KTX 전주역", "accommodation": "한옥 게스트하우스", "tips": ["야시장은 금·토요일에 열려요"]}},
  {"name": "속초", "region": "강원도", "summary": "설악산과 바다를 함께 즐기는 동해안 여행",
   "estimated_cost": 500000, "highlights": ["등산", "바다", "자연", "맛집"], "best_season": "10월",
   "details": {"attractions": ["설악산 국립공원", "속초 해수욕장", "아바이마을"], "local_food": ["오징어순대", "물회"],
               "transport": "고속버스", "accommodation": "설악 리조트", "tips": ["단풍철 설악산은 이른 아침에 가세요"]}},
  {"name": "남해", "region": "경상남도", "summary": "다랭이논과 독일마을이 있는 한적한 섬",
   "estimated_cost": 650000, "highlights": ["자연", "힐링", "바다", "캠핑"], "best_season": "4~5월",
   "details": {"attractions": ["다랭이마을", "독일마을", "상주은모래비치"], "local_food": ["멸치쌈밥", "전복죽"],
               "transport": "자가용 또는 시외버스", "accommodation": "바다 전망 펜션", "tips": ["대중교통이 드물어 차량이 편해요"]}}
]"#;

static CATALOG: LazyLock<Vec<Destination>> =
    LazyLock::new(|| serde_json::from_str(CATALOG_JSON).unwrap_or_default());

/// Offline [`ChatModel`] answering every travel task by rule
#[derive(Debug, Default, Clone)]
pub struct OfflineModel;

impl OfflineModel {
    pub fn new() -> Self {
        Self
    }

    /// Destinations the model can suggest
    pub fn catalog() -> &'static [Destination] {
        &CATALOG
    }

    fn respond(&self, task: &str, messages: &[Message]) -> CapabilityResult<String> {
        let prompt = last_human(messages);
        match task {
            INTENT_CLASSIFIER => {
                let label = classify(last_user_line(prompt).unwrap_or(prompt));
                Ok(format!(r#"{{"intent": "{label}"}}"#))
            }
            GENERAL_CHAT => Ok(GREETING.to_string()),
            COLLECT_PREFERENCES => {
                let said: Vec<&str> = user_lines(prompt).collect();
                json(&extract_preferences(&said.join("\n")))
            }
            GENERATE_CANDIDATES => {
                let prefs: UserPreferences = section(prompt, "사용자 조건: ")
                    .and_then(|line| serde_json::from_str(line).ok())
                    .unwrap_or_default();
                let rejected: Vec<&str> = section(prompt, "다시 제안하지 마세요): ")
                    .map(|line| line.split(", ").collect())
                    .unwrap_or_default();
                json(&suggest(&prefs, &rejected))
            }
            VALIDATE_CANDIDATES | VALIDATE_INFORMATION => Ok(format!(
                r#"{{"score": {OFFLINE_SCORE}, "feedback": "오프라인 기본 평가"}}"#
            )),
            ENRICH_INFORMATION => {
                let details: Vec<serde_json::Value> = CATALOG
                    .iter()
                    .map(|d| serde_json::json!({"name": d.name, "details": d.details}))
                    .collect();
                json(&details)
            }
            // An empty ranking makes the node order by interest overlap
            RANK_DESTINATIONS => Ok("[]".to_string()),
            other => Err(CapabilityError::Transport(format!(
                "offline model has no rule for task '{other}'"
            ))),
        }
    }
}

#[async_trait]
impl ChatModel for OfflineModel {
    async fn chat(&self, request: ChatRequest) -> CapabilityResult<ChatResponse> {
        let text = self.respond(request.task(), &request.messages)?;
        debug!(task = request.task(), chars = text.len(), "Offline reply");
        Ok(ChatResponse::new(text))
    }

    fn model_name(&self) -> &str {
        "offline"
    }
}

fn json<T: serde::Serialize>(value: &T) -> CapabilityResult<String> {
    serde_json::to_string(value).map_err(|e| CapabilityError::Transport(e.to_string()))
}

fn last_human(messages: &[Message]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::Human)
        .map(|m| m.text())
        .unwrap_or("")
}

/// Lines of a transcript spoken by the user, without the role prefix
fn user_lines(transcript: &str) -> impl Iterator<Item = &str> {
    transcript
        .lines()
        .filter_map(|line| line.strip_prefix("user: "))
}

fn last_user_line(transcript: &str) -> Option<&str> {
    user_lines(transcript).last()
}

/// Rest of the first line that starts with `marker`
fn section<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| line.strip_prefix(marker))
        .map(str::trim)
}

fn classify(text: &str) -> &'static str {
    if OFF_TOPIC_KEYWORDS.iter().any(|k| text.contains(k)) {
        "irrelevant_chat"
    } else if TRAVEL_KEYWORDS.iter().any(|k| text.contains(k))
        || !extract_preferences(text).is_empty()
    {
        "recommend_travel"
    } else {
        "general_chat"
    }
}

/// Pull whatever preferences the keyword rules can recognize
pub fn extract_preferences(text: &str) -> UserPreferences {
    let first = |re: &Regex| re.find(text).map(|m| m.as_str().trim().to_string());

    UserPreferences {
        budget: BUDGET_REGEX
            .find(text)
            .and_then(|m| parse_amount(m.as_str())),
        duration: first(&DURATION_REGEX),
        interests: INTEREST_KEYWORDS
            .iter()
            .filter(|k| text.contains(*k))
            .map(|k| k.to_string())
            .collect(),
        travel_style: None,
        season: first(&SEASON_REGEX),
        companion: COMPANIONS
            .iter()
            .find(|c| text.contains(*c))
            .map(|c| c.to_string()),
    }
}

/// Catalog entries ordered by fit, affordable ones first
fn suggest(prefs: &UserPreferences, rejected: &[&str]) -> Vec<Destination> {
    let overlap = |d: &Destination| {
        d.highlights
            .iter()
            .filter(|h| prefs.interests.iter().any(|i| i == *h))
            .count()
    };

    let mut pool: Vec<&Destination> = CATALOG
        .iter()
        .filter(|d| !rejected.iter().any(|r| d.same_place(r)))
        .collect();
    pool.sort_by_key(|d| (!d.within_budget(prefs.budget), std::cmp::Reverse(overlap(d))));

    pool.into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|d| Destination {
            details: None,
            ..d.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ask(task: &str, prompt: &str) -> String {
        let request = ChatRequest::new(vec![Message::system("rules"), Message::human(prompt)])
            .with_task(task);
        OfflineModel::new()
            .chat(request)
            .await
            .map(|r| r.text().to_string())
            .unwrap()
    }

    #[test]
    fn test_catalog_parses() {
        let catalog = OfflineModel::catalog();
        assert_eq!(catalog.len(), 8);
        assert!(catalog.iter().all(|d| d.details.is_some() && d.estimated_cost.is_some()));
    }

    #[test]
    fn test_extract_preferences() {
        let prefs = extract_preferences("예산은 100만원, 2박 3일로 가족이랑 바다랑 맛집 위주로 10월에");
        assert_eq!(prefs.budget, Some(1_000_000));
        assert_eq!(prefs.duration.as_deref(), Some("2박 3일"));
        assert_eq!(prefs.interests, vec!["바다", "맛집"]);
        assert_eq!(prefs.season.as_deref(), Some("10월"));
        assert_eq!(prefs.companion.as_deref(), Some("가족"));
        assert!(prefs.is_sufficient());
    }

    #[test]
    fn test_duration_is_not_a_budget() {
        let prefs = extract_preferences("3박 4일 정도");
        assert_eq!(prefs.budget, None);
        assert_eq!(prefs.duration.as_deref(), Some("3박 4일"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("제주도 여행 가고 싶어요"), "recommend_travel");
        assert_eq!(classify("예산 50만원이에요"), "recommend_travel");
        assert_eq!(classify("오늘 날씨 어때?"), "irrelevant_chat");
        assert_eq!(classify("안녕하세요"), "general_chat");
    }

    #[tokio::test]
    async fn test_intent_reads_last_user_line() {
        let reply = ask(
            INTENT_CLASSIFIER,
            "대화:\nuser: 여행 추천해줘\nassistant: 예산을 알려주세요\nuser: 오늘 주식 어때?",
        )
        .await;
        assert_eq!(reply, r#"{"intent": "irrelevant_chat"}"#);
    }

    #[tokio::test]
    async fn test_preferences_come_from_user_lines_only() {
        let reply = ask(
            COLLECT_PREFERENCES,
            "지금까지 파악된 조건: {}\n\n대화:\nuser: 2박 3일 온천 여행\nassistant: 예: 1인 100만원",
        )
        .await;
        let prefs: UserPreferences = serde_json::from_str(&reply).unwrap();
        assert_eq!(prefs.budget, None);
        assert_eq!(prefs.interests, vec!["온천"]);
    }

    #[tokio::test]
    async fn test_candidates_skip_rejected_and_prefer_affordable() {
        let prompt = "사용자 조건: {\"budget\": 500000, \"interests\": [\"바다\"]}\n\n\
                      이전에 제안했지만 적합하지 않았던 후보(다시 제안하지 마세요): 강릉, 속초";
        let reply = ask(GENERATE_CANDIDATES, prompt).await;
        let candidates: Vec<Destination> = serde_json::from_str(&reply).unwrap();

        assert_eq!(candidates.len(), MAX_SUGGESTIONS);
        assert!(candidates.iter().all(|d| d.name != "강릉" && d.name != "속초"));
        assert!(candidates[..3].iter().all(|d| d.within_budget(Some(500_000))));
        assert!(candidates.iter().all(|d| d.details.is_none()));
    }

    #[tokio::test]
    async fn test_unknown_task_fails() {
        let request = ChatRequest::new(vec![Message::human("hi")]).with_task("summarize");
        let err = OfflineModel::new().chat(request).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Transport(_)));
    }
}
