//! Role-tagged conversation messages
//!
//! Messages are persisted as `{"role": "...", "content": "..."}` objects and
//! are also the unit of input to a [`ChatModel`](crate::llm::ChatModel).
//! Roles serialize to the lowercase names chat-completion APIs use:
//! `"system"`, `"user"`, `"assistant"`.

use serde::{Deserialize, Serialize};

/// Sender of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions for the model
    System,

    /// End-user input
    #[serde(rename = "user", alias = "human")]
    Human,

    /// Generated reply
    #[serde(alias = "ai")]
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::Human => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender
    pub role: MessageRole,

    /// Text content
    pub content: String,
}

impl Message {
    /// Create a message with the given role and content
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a human message
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, content)
    }

    /// Create a user message (alias for `human`)
    pub fn user(content: impl Into<String>) -> Self {
        Self::human(content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Message text
    pub fn text(&self) -> &str {
        &self.content
    }

    /// Whether this message was written by the end user
    pub fn is_human(&self) -> bool {
        self.role == MessageRole::Human
    }

    /// Whether this message was generated
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

/// Last message in `messages` sent with `role`
pub fn last_message_with_role(messages: &[Message], role: MessageRole) -> Option<&Message> {
    messages.iter().rev().find(|m| m.role == role)
}

/// Render messages as a plain transcript, one `role: content` line each
///
/// Used when a whole history has to be embedded in a single prompt.
pub fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_wire_names() {
        let msg = Message::human("안녕하세요");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "user", "content": "안녕하세요"})
        );

        let parsed: Message = serde_json::from_value(json!({"role": "human", "content": "x"})).unwrap();
        assert_eq!(parsed.role, MessageRole::Human);

        let parsed: Message = serde_json::from_value(json!({"role": "assistant", "content": "y"})).unwrap();
        assert!(parsed.is_assistant());
    }

    #[test]
    fn test_last_message_with_role() {
        let messages = vec![
            Message::human("first"),
            Message::assistant("reply"),
            Message::human("second"),
        ];

        assert_eq!(last_message_with_role(&messages, MessageRole::Human).unwrap().text(), "second");
        assert_eq!(last_message_with_role(&messages, MessageRole::Assistant).unwrap().text(), "reply");
        assert!(last_message_with_role(&messages, MessageRole::System).is_none());
    }

    #[test]
    fn test_transcript() {
        let messages = vec![Message::human("hi"), Message::assistant("hello")];
        assert_eq!(transcript(&messages), "user: hi\nassistant: hello");
    }
}
