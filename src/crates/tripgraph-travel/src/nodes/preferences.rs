use super::{ask_json, log_degraded};
use crate::preferences::{PreferenceField, UserPreferences};
use crate::prompts;
use crate::state::{TravelState, TravelUpdate};
use async_trait::async_trait;
use tracing::debug;
use tripgraph_core::{Node, NodeContext};

/// Extracts preferences from the whole conversation and asks for whatever
/// required field is still missing
///
/// Also the landing point when candidate generation has used up its
/// retries; the user is then asked to revise their conditions instead.
pub struct CollectPreferences;

impl CollectPreferences {
    fn ask_for_missing(missing: &[PreferenceField], known: &UserPreferences) -> String {
        let mut reply = String::from("딱 맞는 여행지를 추천해 드리려면 몇 가지를 더 알려주세요.\n");
        for field in missing {
            reply.push_str(&format!("- {} ({})\n", field.label(), field.example()));
        }
        if !known.is_empty() {
            reply.push_str(&format!("\n지금까지 알려주신 조건: {}", known.summary()));
        }
        reply.trim_end().to_string()
    }

    fn ask_to_revise(state: &TravelState) -> String {
        let mut reply = String::from(
            "죄송해요. 말씀하신 조건으로는 만족스러운 여행지 후보를 찾지 못했어요.",
        );
        if !state.validation_feedback.trim().is_empty() {
            reply.push_str(&format!("\n(검토 의견: {})", state.validation_feedback.trim()));
        }
        reply.push_str("\n예산이나 기간, 관심사를 조금 바꿔서 다시 말씀해 주시겠어요?");
        reply
    }
}

#[async_trait]
impl Node<TravelState> for CollectPreferences {
    async fn run(&self, state: &TravelState, ctx: &NodeContext) -> TravelUpdate {
        if !state.retries_remain() {
            return TravelUpdate::say(Self::ask_to_revise(state));
        }

        let mut update = TravelUpdate::default();
        let mut misunderstood = false;
        let known = match ask_json::<UserPreferences>(ctx, prompts::preferences(state), 0.0).await {
            Ok(extracted) => {
                let merged = state.user_preferences.merged_with(&extracted);
                update.user_preferences = Some(extracted);
                merged
            }
            Err(failure) => {
                log_degraded(ctx, &failure);
                misunderstood = true;
                state.user_preferences.clone()
            }
        };

        let missing = known.missing_required();
        debug!(
            thread_id = ctx.thread_id(),
            missing = ?missing.iter().map(|f| f.key()).collect::<Vec<_>>(),
            "Collected preferences"
        );

        if !missing.is_empty() {
            let mut reply = Self::ask_for_missing(&missing, &known);
            if misunderstood {
                reply.insert_str(0, "죄송해요, 말씀을 정확히 이해하지 못했어요. ");
            }
            update = update.with_reply(reply);
        }
        update
    }
}
