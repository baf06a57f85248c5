//! Conversation state for the travel workflow
//!
//! [`TravelState`] is what gets persisted per thread; its JSON field names
//! are the stored format. [`TravelUpdate`] is the partial update every node
//! returns, where an unset field means "no write".

use crate::destination::Destination;
use crate::preferences::UserPreferences;
use serde::{Deserialize, Serialize};
use tripgraph_core::{
    AppendReducer, GraphState, MergeReducer, Message, OverwriteReducer, StateSchema,
};

/// Retry budget shared by both retry loops
pub const MAX_RETRIES: u32 = 2;

/// What the user wants from this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    RecommendTravel,
    GeneralChat,
    IrrelevantChat,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::RecommendTravel => "recommend_travel",
            Intent::GeneralChat => "general_chat",
            Intent::IrrelevantChat => "irrelevant_chat",
        }
    }

    /// Find an intent label anywhere in free text
    pub fn from_text(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        [Intent::RecommendTravel, Intent::IrrelevantChat, Intent::GeneralChat]
            .into_iter()
            .find(|intent| lowered.contains(intent.as_str()))
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated state of one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelState {
    pub messages: Vec<Message>,
    pub user_preferences: UserPreferences,
    pub candidates: Vec<Destination>,
    pub enriched_data: Vec<Destination>,
    pub filtered_options: Vec<Destination>,
    pub final_recommendations: Vec<Destination>,
    pub retry_count: u32,
    pub enrich_retry_count: u32,
    pub max_retries: u32,
    pub validation_score: f64,
    pub info_quality_score: f64,
    pub validation_feedback: String,
    pub intent: Option<Intent>,
    pub current_step: String,
}

impl Default for TravelState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            user_preferences: UserPreferences::default(),
            candidates: Vec::new(),
            enriched_data: Vec::new(),
            filtered_options: Vec::new(),
            final_recommendations: Vec::new(),
            retry_count: 0,
            enrich_retry_count: 0,
            max_retries: MAX_RETRIES,
            validation_score: 0.0,
            info_quality_score: 0.0,
            validation_feedback: String::new(),
            intent: None,
            current_step: String::new(),
        }
    }
}

impl TravelState {
    /// Most recent message from the user
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_human())
    }

    /// Most recent message of any role
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether a shortlist has been presented in this conversation
    pub fn info_complete(&self) -> bool {
        !self.final_recommendations.is_empty()
    }

    pub fn retries_remain(&self) -> bool {
        self.retry_count < self.max_retries
    }

    pub fn enrich_retries_remain(&self) -> bool {
        self.enrich_retry_count < self.max_retries
    }
}

impl GraphState for TravelState {
    type Update = TravelUpdate;

    fn schema() -> StateSchema {
        StateSchema::new()
            .with_field("messages", AppendReducer)
            .with_field("user_preferences", MergeReducer)
            .with_field("candidates", OverwriteReducer)
            .with_field("enriched_data", OverwriteReducer)
            .with_field("filtered_options", OverwriteReducer)
            .with_field("final_recommendations", OverwriteReducer)
            .with_field("retry_count", OverwriteReducer)
            .with_field("enrich_retry_count", OverwriteReducer)
            .with_field("max_retries", OverwriteReducer)
            .with_field("validation_score", OverwriteReducer)
            .with_field("info_quality_score", OverwriteReducer)
            .with_field("validation_feedback", OverwriteReducer)
            .with_field("intent", OverwriteReducer)
            .with_step_field("current_step")
    }
}

/// Partial update returned by a travel node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TravelUpdate {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_preferences: Option<UserPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Destination>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enriched_data: Option<Vec<Destination>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_options: Option<Vec<Destination>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_recommendations: Option<Vec<Destination>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrich_retry_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info_quality_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
}

impl TravelUpdate {
    /// Turn input: append the user's message and give the turn a fresh
    /// retry budget
    pub fn user_turn(message: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::human(message)],
            retry_count: Some(0),
            enrich_retry_count: Some(0),
            ..Default::default()
        }
    }

    /// Append an assistant reply
    pub fn say(text: impl Into<String>) -> Self {
        Self::default().with_reply(text)
    }

    pub fn with_reply(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(text));
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.validation_feedback = Some(feedback.into());
        self
    }
}
