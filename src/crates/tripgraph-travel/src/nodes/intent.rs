use super::{ask, log_degraded};
use crate::prompts;
use crate::state::{Intent, TravelState, TravelUpdate};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use tripgraph_core::{extract_json_as, Node, NodeContext};

/// Fixed reply for requests outside the service's scope
pub const IRRELEVANT_REPLY: &str = "저는 여행지 추천을 도와드리는 챗봇이에요. \
날씨나 정치처럼 여행과 관계없는 이야기는 답변드리기 어려워요. \
원하시는 예산, 여행 기간, 관심사를 알려주시면 딱 맞는 여행지를 찾아드릴게요!";

const GENERAL_FALLBACK: &str = "안녕하세요! 여행지 추천이 필요하시면 \
예산, 여행 기간, 관심사를 알려주세요.";

#[derive(Deserialize)]
struct IntentLabel {
    intent: Intent,
}

/// `{"intent": ...}` if present, otherwise any label mentioned in the text
fn parse_intent(text: &str) -> Option<Intent> {
    extract_json_as::<IntentLabel>(text)
        .ok()
        .map(|label| label.intent)
        .or_else(|| Intent::from_text(text))
}

/// Labels the turn as a recommendation request, small talk, or off-topic
pub struct IntentClassifier;

impl IntentClassifier {
    /// Used when the model gives no usable label: a conversation that has
    /// already produced preferences is assumed to still be about travel
    fn fallback(state: &TravelState) -> Intent {
        if state.user_preferences.is_empty() {
            Intent::GeneralChat
        } else {
            Intent::RecommendTravel
        }
    }
}

#[async_trait]
impl Node<TravelState> for IntentClassifier {
    async fn run(&self, state: &TravelState, ctx: &NodeContext) -> TravelUpdate {
        if state.last_user_message().is_none() {
            return TravelUpdate {
                intent: Some(Intent::GeneralChat),
                ..Default::default()
            };
        }

        let intent = match ask(ctx, prompts::intent(state), 0.0).await {
            Ok(text) => parse_intent(&text).unwrap_or_else(|| Self::fallback(state)),
            Err(failure) => {
                log_degraded(ctx, &failure);
                Self::fallback(state)
            }
        };

        debug!(thread_id = ctx.thread_id(), %intent, "Classified turn");
        TravelUpdate {
            intent: Some(intent),
            ..Default::default()
        }
    }
}

/// Free-form friendly reply for small talk
pub struct GeneralChat;

#[async_trait]
impl Node<TravelState> for GeneralChat {
    async fn run(&self, state: &TravelState, ctx: &NodeContext) -> TravelUpdate {
        match ask(ctx, prompts::general_chat(state), 0.7).await {
            Ok(text) if !text.trim().is_empty() => TravelUpdate::say(text.trim()),
            Ok(_) => TravelUpdate::say(GENERAL_FALLBACK),
            Err(failure) => {
                log_degraded(ctx, &failure);
                TravelUpdate::say(GENERAL_FALLBACK)
            }
        }
    }
}

/// Canned guidance back towards travel topics
pub fn irrelevant_chat(_state: &TravelState) -> TravelUpdate {
    TravelUpdate::say(IRRELEVANT_REPLY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::test_support::run;
    use crate::preferences::UserPreferences;
    use tripgraph_core::Message;

    fn asked(text: &str) -> TravelState {
        TravelState {
            messages: vec![Message::human(text)],
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_intent() {
        assert_eq!(
            parse_intent("```json\n{\"intent\": \"recommend_travel\"}\n```"),
            Some(Intent::RecommendTravel)
        );
        assert_eq!(parse_intent("irrelevant_chat 입니다"), Some(Intent::IrrelevantChat));
        assert_eq!(parse_intent("{\"intent\": \"shopping\"}"), None);
    }

    #[tokio::test]
    async fn test_classifies_from_model_reply() {
        let update = run(
            &IntentClassifier,
            "intent_classifier",
            &asked("오늘 날씨랑 정치 얘기해줘"),
            &[("intent_classifier", r#"{"intent": "irrelevant_chat"}"#)],
        )
        .await;
        assert_eq!(update.intent, Some(Intent::IrrelevantChat));
        assert!(update.messages.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_without_model() {
        let mut state = asked("음");
        let update = run(&IntentClassifier, "intent_classifier", &state, &[]).await;
        assert_eq!(update.intent, Some(Intent::GeneralChat));

        state.user_preferences = UserPreferences {
            budget: Some(1_000_000),
            ..Default::default()
        };
        let update = run(&IntentClassifier, "intent_classifier", &state, &[]).await;
        assert_eq!(update.intent, Some(Intent::RecommendTravel));
    }

    #[tokio::test]
    async fn test_general_chat_falls_back_to_canned_reply() {
        let update = run(&GeneralChat, "general_chat", &asked("안녕하세요"), &[]).await;
        assert_eq!(update.messages, vec![Message::assistant(GENERAL_FALLBACK)]);

        let update = run(
            &GeneralChat,
            "general_chat",
            &asked("안녕하세요"),
            &[("general_chat", "  반가워요!  ")],
        )
        .await;
        assert_eq!(update.messages, vec![Message::assistant("반가워요!")]);
    }

    #[test]
    fn test_irrelevant_chat_only_replies() {
        let update = irrelevant_chat(&asked("정치 얘기"));
        assert_eq!(update, TravelUpdate::say(IRRELEVANT_REPLY));
    }
}
