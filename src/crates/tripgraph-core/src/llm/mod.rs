//! Text-generation capability used by graph nodes
//!
//! The executor is provider-agnostic: nodes receive an `Arc<dyn ChatModel>`
//! through their [`NodeContext`](crate::node::NodeContext) and send it a
//! [`ChatRequest`]. Concrete providers (a remote chat-completions client,
//! a scripted model for tests) live in the `tripgraph-llm` crate.
//!
//! ```rust,ignore
//! use tripgraph_core::llm::{ChatModel, ChatRequest};
//! use tripgraph_core::Message;
//!
//! let request = ChatRequest::new(vec![
//!     Message::system("Answer in one word."),
//!     Message::human("Capital of France?"),
//! ])
//! .with_temperature(0.0)
//! .with_task("capital_lookup");
//!
//! let response = model.chat(request).await?;
//! println!("{}", response.text());
//! ```

pub mod config;
pub mod error;
pub mod response;
pub mod traits;

pub use config::{ChatConfig, ChatRequest};
pub use error::{CapabilityError, CapabilityResult};
pub use response::{ChatResponse, UsageMetadata};
pub use traits::ChatModel;
