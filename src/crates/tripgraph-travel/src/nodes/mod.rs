//! The travel workflow's processing steps
//!
//! Model-backed steps are small structs implementing [`Node`]; purely
//! deterministic steps are plain functions wrapped with
//! [`pure_node`](tripgraph_core::pure_node) in [`crate::graph`].
//!
//! No step can fail. A failed model call or unparseable output is logged
//! at `warn` and replaced by the step's degraded default.
//!
//! [`Node`]: tripgraph_core::Node

mod candidates;
mod enrich;
mod intent;
mod preferences;
mod present;
mod selection;

pub use candidates::{increment_retry, GenerateCandidates, ValidateCandidates};
pub use enrich::{increment_enrich_retry, EnrichInformation, ValidateInformation};
pub use intent::{irrelevant_chat, GeneralChat, IntentClassifier, IRRELEVANT_REPLY};
pub use preferences::CollectPreferences;
pub use present::{present_recommendations, NO_RESULTS_REPLY};
pub use selection::{filter_options, final_check, RankDestinations};

use crate::error::StepFailure;
use crate::lenient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;
use tripgraph_core::{extract_json_as, ChatRequest, Message, NodeContext};

/// Send `messages` to the model and return the reply text
pub(crate) async fn ask(
    ctx: &NodeContext,
    messages: Vec<Message>,
    temperature: f32,
) -> Result<String, StepFailure> {
    let request = ChatRequest::new(messages).with_temperature(temperature);
    let response = ctx.chat(request).await?;
    Ok(response.text().to_string())
}

/// Send `messages` and parse the first JSON value in the reply as `T`
pub(crate) async fn ask_json<T: DeserializeOwned>(
    ctx: &NodeContext,
    messages: Vec<Message>,
    temperature: f32,
) -> Result<T, StepFailure> {
    let text = ask(ctx, messages, temperature).await?;
    Ok(extract_json_as(&text)?)
}

pub(crate) fn log_degraded(ctx: &NodeContext, failure: &StepFailure) {
    warn!(
        thread_id = ctx.thread_id(),
        node = ctx.node(),
        error = %failure,
        "Using degraded default"
    );
}

/// `{"score": .., "feedback": ..}` verdict from a validation call
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Assessment {
    #[serde(default, deserialize_with = "lenient::score")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub feedback: Option<String>,
}

/// A list of records, either bare or wrapped in a single-key object
/// such as `{"candidates": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Wrapped(std::collections::BTreeMap<String, Vec<T>>),
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Wrapped(map) => map.into_values().flatten().collect(),
        }
    }
}
