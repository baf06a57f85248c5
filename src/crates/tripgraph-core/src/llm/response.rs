//! Response types for text generation

use crate::messages::Message;
use serde::{Deserialize, Serialize};

/// A completed generation
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Assistant message produced by the model
    pub message: Message,

    /// Token accounting, when the provider reports it
    pub usage: Option<UsageMetadata>,
}

impl ChatResponse {
    /// Wrap generated text as an assistant message
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(text),
            usage: None,
        }
    }

    /// Attach usage metadata
    pub fn with_usage(mut self, usage: UsageMetadata) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Generated text
    pub fn text(&self) -> &str {
        self.message.text()
    }
}

/// Token usage for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl UsageMetadata {
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total_tokens(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}
