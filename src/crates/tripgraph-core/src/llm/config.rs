//! Request types for text generation

use crate::messages::Message;
use serde::{Deserialize, Serialize};

/// A request to a chat model: messages plus generation settings
///
/// `task` names the node (or other caller) issuing the request. Remote
/// providers ignore it; scripted models use it to pick a canned response.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation sent to the model
    pub messages: Vec<Message>,

    /// Generation settings
    pub config: ChatConfig,

    /// Caller label, usually the node name
    pub task: Option<String>,
}

impl ChatRequest {
    /// Create a request with default settings
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
            task: None,
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Label the request with the issuing task
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Task label, or `""` when unset
    pub fn task(&self) -> &str {
        self.task.as_deref().unwrap_or("")
    }
}

/// Generation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Sampling temperature; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Output token cap; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = ChatRequest::new(vec![Message::human("hi")])
            .with_temperature(0.3)
            .with_max_tokens(200)
            .with_task("intent_classifier");

        assert_eq!(request.config.temperature, Some(0.3));
        assert_eq!(request.config.max_tokens, Some(200));
        assert_eq!(request.task(), "intent_classifier");
    }

    #[test]
    fn test_task_defaults_to_empty() {
        assert_eq!(ChatRequest::new(Vec::new()).task(), "");
    }
}
