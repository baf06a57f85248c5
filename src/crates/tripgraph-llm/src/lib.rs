//! # tripgraph-llm
//!
//! [`ChatModel`](tripgraph_core::llm::ChatModel) implementations:
//!
//! - [`OpenAiClient`] - OpenAI-compatible `/chat/completions` over HTTP,
//!   with retries and exponential backoff for timeouts, rate limits and
//!   5xx responses
//! - [`ScriptedChatModel`] - deterministic replies per task label, for tests
//!   and offline runs
//!
//! Provider failures are reported as [`LlmError`] internally and converted
//! to [`CapabilityError`](tripgraph_core::llm::CapabilityError) at the trait
//! boundary.

pub mod config;
pub mod error;
pub mod mock;
#[cfg(feature = "remote")]
pub mod remote;

pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use mock::{ScriptedChatModel, ScriptedReply};
#[cfg(feature = "remote")]
pub use remote::OpenAiClient;
