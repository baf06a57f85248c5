//! Turn service: one user message in, one reply out

use crate::error::{Result, ServiceError};
use crate::graph::build_travel_graph;
use crate::state::{TravelState, TravelUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tripgraph_checkpoint::StateStore;
use tripgraph_core::{ChatModel, CompiledGraph, ExecutionConfig};

/// Reply used when a turn ends without an assistant message
pub const FALLBACK_ANSWER: &str = "죄송합니다. 응답을 생성하는 중에 오류가 발생했습니다.";

/// Inbound chat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelRequest {
    pub message: String,
    pub thread_id: String,
}

impl TravelRequest {
    pub fn new(thread_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            thread_id: thread_id.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.thread_id.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("thread_id is empty".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("message is empty".to_string()));
        }
        Ok(())
    }
}

/// Reply to a [`TravelRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelReply {
    pub answer: String,
    pub thread_id: String,
    /// Whether this conversation has produced a shortlist
    pub info_complete: bool,
    /// Nodes executed during the turn, in order
    #[serde(skip)]
    pub path: Vec<String>,
}

/// Runs travel conversations over a shared store and model
///
/// Cloning is cheap and clones share per-thread locking, so one service can
/// be handed to many tasks.
#[derive(Clone)]
pub struct TravelChatService {
    graph: CompiledGraph<TravelState>,
}

impl TravelChatService {
    pub fn new(
        model: Arc<dyn ChatModel>,
        store: Arc<dyn StateStore>,
        config: ExecutionConfig,
    ) -> Result<Self> {
        let graph = build_travel_graph()?
            .with_model(model)
            .with_store(store)
            .with_config(config);
        Ok(Self { graph })
    }

    /// Run one turn with the configured deadline
    pub async fn chat(&self, request: TravelRequest) -> Result<TravelReply> {
        let deadline = self.graph.config().deadline;
        self.chat_with_deadline(request, deadline).await
    }

    /// Run one turn with an explicit deadline (`None` for none)
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidRequest`] for a blank message or thread id
    /// - [`ServiceError::Graph`] for store faults, an elapsed deadline or
    ///   the step limit; in the latter two cases the thread keeps its
    ///   pre-turn state
    pub async fn chat_with_deadline(
        &self,
        request: TravelRequest,
        deadline: Option<Duration>,
    ) -> Result<TravelReply> {
        request.validate()?;
        let TravelRequest { message, thread_id } = request;

        let outcome = self
            .graph
            .invoke_with_deadline(&thread_id, TravelUpdate::user_turn(message), deadline)
            .await?;

        let state = &outcome.state;
        let answer = state
            .last_message()
            .filter(|m| m.is_assistant())
            .map(|m| m.text().to_string())
            .unwrap_or_else(|| FALLBACK_ANSWER.to_string());

        info!(
            thread_id = %thread_id,
            intent = ?state.intent,
            steps = outcome.steps(),
            info_complete = state.info_complete(),
            "Answered turn"
        );

        Ok(TravelReply {
            answer,
            info_complete: state.info_complete(),
            thread_id,
            path: outcome.path,
        })
    }

    /// Stored state of a conversation (defaults for an unseen one)
    pub async fn state(&self, thread_id: &str) -> Result<TravelState> {
        Ok(self.graph.get_state(thread_id).await?)
    }

    /// Identifiers of all stored conversations
    pub async fn threads(&self) -> Result<Vec<String>> {
        Ok(self.graph.list_threads().await?)
    }

    /// Mermaid rendering of the workflow
    pub fn draw_mermaid(&self) -> String {
        self.graph.draw_mermaid()
    }

    pub fn graph(&self) -> &CompiledGraph<TravelState> {
        &self.graph
    }
}
