//! Remote LLM provider implementations.
//!
//! - **OpenAI** - any endpoint speaking the OpenAI `/chat/completions`
//!   protocol (OpenAI itself, Azure-style proxies, local gateways)

pub mod openai;

pub use openai::OpenAiClient;
