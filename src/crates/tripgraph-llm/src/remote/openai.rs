//! OpenAI client implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use tripgraph_llm::remote::OpenAiClient;
//! use tripgraph_llm::config::{RemoteLlmConfig, DEFAULT_BASE_URL};
//! use tripgraph_core::llm::{ChatModel, ChatRequest};
//! use tripgraph_core::Message;
//!
//! let config = RemoteLlmConfig::from_env("OPENAI_API_KEY", DEFAULT_BASE_URL, "gpt-4o-mini")?;
//! let client = OpenAiClient::new(config)?;
//!
//! let request = ChatRequest::new(vec![Message::human("Hello!")]);
//! let response = client.chat(request).await?;
//! ```

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tripgraph_core::llm::{
    CapabilityResult, ChatModel, ChatRequest, ChatResponse, UsageMetadata,
};
use tripgraph_core::Message;

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new OpenAI client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RemoteLlmConfig {
        &self.config
    }

    /// Convert a message to OpenAI message format.
    fn convert_message(&self, msg: &Message) -> OpenAiMessage {
        OpenAiMessage {
            role: msg.role.as_str().to_string(),
            content: Some(msg.text().to_string()),
        }
    }

    fn build_body(&self, request: &ChatRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| self.convert_message(m))
                .collect(),
            temperature: request.config.temperature,
            max_tokens: request.config.max_tokens,
            stream: false,
        }
    }

    /// Convert OpenAI response to ChatResponse.
    fn convert_response(&self, openai_resp: OpenAiResponse) -> Result<ChatResponse> {
        let choice = openai_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

        let mut response = ChatResponse::new(choice.message.content.unwrap_or_default());
        if let Some(u) = openai_resp.usage {
            response = response.with_usage(UsageMetadata::new(u.prompt_tokens, u.completion_tokens));
        }
        Ok(response)
    }

    /// One HTTP round trip, without retries.
    async fn send_once(&self, body: &OpenAiRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let mut req = self
            .client
            .post(&url)
            .json(body)
            .header("Authorization", format!("Bearer {}", self.config.api_key));

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.config.timeout)
            } else {
                LlmError::HttpError(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status, error_text));
        }

        let openai_resp: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        self.convert_response(openai_resp)
    }

    /// Send with exponential backoff on retryable failures.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = self.build_body(request);
        let mut attempt = 0;

        loop {
            match self.send_once(&body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.backoff_for(attempt);
                    warn!(
                        task = request.task(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying chat completion"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> CapabilityResult<ChatResponse> {
        debug!(task = request.task(), model = %self.config.model, messages = request.messages.len(), "Chat completion");
        Ok(self.complete(&request).await?)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}
