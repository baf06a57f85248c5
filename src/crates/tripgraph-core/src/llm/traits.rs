//! The text-generation trait

use super::config::ChatRequest;
use super::error::CapabilityResult;
use super::response::ChatResponse;
use async_trait::async_trait;

/// A provider that turns a conversation into generated text
///
/// Implementations must be `Send + Sync`; the executor shares one instance
/// across every node and every concurrent thread via `Arc<dyn ChatModel>`.
///
/// # Errors
///
/// Returns [`CapabilityError`](super::CapabilityError) when no text could be
/// produced. Callers inside a graph treat every error as a degraded outcome.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete response for `request`
    async fn chat(&self, request: ChatRequest) -> CapabilityResult<ChatResponse>;

    /// Short provider/model identifier for logs
    fn model_name(&self) -> &str {
        "unknown"
    }
}
