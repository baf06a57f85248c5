//! Scripted chat model for tests and offline runs.
//!
//! Replies are queued per task label (the name of the calling node). Each
//! call to a task takes the next reply in its queue; once the queue is
//! exhausted the last reply repeats. Tasks with no script get the default
//! reply, which is a transport error unless configured otherwise.
//!
//! ```rust
//! use tripgraph_llm::mock::ScriptedChatModel;
//! use tripgraph_core::llm::{ChatModel, ChatRequest};
//!
//! # tokio_test_block_on(async {
//! let model = ScriptedChatModel::new()
//!     .with_replies("validate_candidates", ["{\"score\": 0.5}", "{\"score\": 0.8}"]);
//!
//! let ask = || ChatRequest::new(Vec::new()).with_task("validate_candidates");
//! assert_eq!(model.chat(ask()).await.unwrap().text(), "{\"score\": 0.5}");
//! assert_eq!(model.chat(ask()).await.unwrap().text(), "{\"score\": 0.8}");
//! assert_eq!(model.chat(ask()).await.unwrap().text(), "{\"score\": 0.8}");
//! assert_eq!(model.calls("validate_candidates"), 3);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tripgraph_core::llm::{
    CapabilityError, CapabilityResult, ChatModel, ChatRequest, ChatResponse,
};
use tripgraph_core::Message;

/// One canned outcome
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    /// Return this text
    Text(String),
    /// Fail with this error
    Error(CapabilityError),
}

impl From<&str> for ScriptedReply {
    fn from(text: &str) -> Self {
        ScriptedReply::Text(text.to_string())
    }
}

impl From<String> for ScriptedReply {
    fn from(text: String) -> Self {
        ScriptedReply::Text(text)
    }
}

impl From<CapabilityError> for ScriptedReply {
    fn from(err: CapabilityError) -> Self {
        ScriptedReply::Error(err)
    }
}

#[derive(Default)]
struct TaskLog {
    calls: usize,
    last_messages: Vec<Message>,
}

/// Deterministic [`ChatModel`] driven by per-task scripts
pub struct ScriptedChatModel {
    scripts: HashMap<String, Vec<ScriptedReply>>,
    delays: HashMap<String, Duration>,
    default: ScriptedReply,
    log: Mutex<HashMap<String, TaskLog>>,
}

impl ScriptedChatModel {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            delays: HashMap::new(),
            default: ScriptedReply::Error(CapabilityError::Transport(
                "no scripted reply".to_string(),
            )),
            log: Mutex::new(HashMap::new()),
        }
    }

    /// Always answer `task` with `reply`
    pub fn with_reply(self, task: impl Into<String>, reply: impl Into<ScriptedReply>) -> Self {
        self.with_replies(task, [reply])
    }

    /// Answer `task` with `replies` in order, then keep repeating the last
    pub fn with_replies<I, R>(mut self, task: impl Into<String>, replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ScriptedReply>,
    {
        self.scripts
            .insert(task.into(), replies.into_iter().map(Into::into).collect());
        self
    }

    /// Fail every call to `task` with `error`
    pub fn with_error(self, task: impl Into<String>, error: CapabilityError) -> Self {
        self.with_reply(task, error)
    }

    /// Sleep before answering `task`
    pub fn with_delay(mut self, task: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(task.into(), delay);
        self
    }

    /// Reply for tasks without a script
    pub fn with_default(mut self, reply: impl Into<ScriptedReply>) -> Self {
        self.default = reply.into();
        self
    }

    /// Number of calls made for `task`
    pub fn calls(&self, task: &str) -> usize {
        self.log.lock().get(task).map_or(0, |l| l.calls)
    }

    /// Number of calls made across all tasks
    pub fn total_calls(&self) -> usize {
        self.log.lock().values().map(|l| l.calls).sum()
    }

    /// Messages of the most recent request for `task`
    pub fn last_messages(&self, task: &str) -> Option<Vec<Message>> {
        self.log.lock().get(task).map(|l| l.last_messages.clone())
    }

    fn next_reply(&self, task: &str, messages: &[Message]) -> ScriptedReply {
        let index = {
            let mut log = self.log.lock();
            let entry = log.entry(task.to_string()).or_default();
            entry.calls += 1;
            entry.last_messages = messages.to_vec();
            entry.calls - 1
        };

        match self.scripts.get(task) {
            Some(replies) if !replies.is_empty() => {
                replies[index.min(replies.len() - 1)].clone()
            }
            _ => self.default.clone(),
        }
    }
}

impl Default for ScriptedChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn chat(&self, request: ChatRequest) -> CapabilityResult<ChatResponse> {
        let task = request.task().to_string();
        let reply = self.next_reply(&task, &request.messages);

        if let Some(delay) = self.delays.get(&task) {
            tokio::time::sleep(*delay).await;
        }

        match reply {
            ScriptedReply::Text(text) => Ok(ChatResponse::new(text)),
            ScriptedReply::Error(err) => Err(err),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
