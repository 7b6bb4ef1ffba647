//! OpenAI-compatible Chat Completions transport.
//!
//! Speaks the `/chat/completions` wire format, which OpenAI and xAI both
//! accept; pick the backend through the base URL. The transport performs a
//! single attempt per call: no retry loop and no client-side timeout (the
//! agent owns the deadline).

use async_trait::async_trait;
use serde_json::Value;

use crate::llms::base_llm::{ConversationMessage, GenerationTransport, TokenUsage, TransportResponse};
use crate::llms::sampling::SamplingConfig;
use crate::utilities::errors::{OrchestratorError, Result};
use crate::utilities::string_utils::truncate_chars;

/// Default OpenAI endpoint root.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default xAI endpoint root.
pub const XAI_BASE_URL: &str = "https://api.x.ai/v1";

/// Transport for any backend exposing the Chat Completions API.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleTransport {
    provider: String,
    model: String,
    api_key: Option<String>,
    base_url: String,
    organization: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatibleTransport {
    /// OpenAI backend; the key defaults to `OPENAI_API_KEY`.
    pub fn openai(model: impl Into<String>, api_key: Option<String>) -> Self {
        let api_key = api_key.or_else(|| std::env::var("OPENAI_API_KEY").ok());
        let mut transport = Self::new("openai", model, api_key, OPENAI_BASE_URL);
        transport.organization = std::env::var("OPENAI_ORGANIZATION").ok();
        transport
    }

    /// xAI backend; the key defaults to `XAI_API_KEY`.
    pub fn xai(model: impl Into<String>, api_key: Option<String>) -> Self {
        let api_key = api_key.or_else(|| std::env::var("XAI_API_KEY").ok());
        Self::new("xai", model, api_key, XAI_BASE_URL)
    }

    /// Fully explicit constructor (self-hosted gateways, proxies, tests).
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            organization: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the Chat Completions request body.
    ///
    /// Penalties are only sent when non-zero, matching what the proxy layer
    /// in front of these backends forwards.
    pub fn build_request_body(&self, messages: &[ConversationMessage], config: &SamplingConfig) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": config.temperature,
            "top_p": config.top_p,
            "max_tokens": config.max_tokens,
        });

        if config.presence_penalty != 0.0 {
            body["presence_penalty"] = serde_json::json!(config.presence_penalty);
        }
        if config.frequency_penalty != 0.0 {
            body["frequency_penalty"] = serde_json::json!(config.frequency_penalty);
        }

        body
    }

    /// Extract text and usage from a Chat Completions response.
    ///
    /// Prefers the first choice that finished with `stop`, falling back to
    /// the first choice. Content may be a string or an array of text blocks.
    pub fn parse_response(&self, response: &Value) -> Result<TransportResponse> {
        let choices = response
            .get("choices")
            .and_then(|c| c.as_array())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| OrchestratorError::provider(None, "No choices in completion response"))?;

        let choice = choices
            .iter()
            .find(|c| c.get("finish_reason").and_then(|r| r.as_str()) == Some("stop"))
            .unwrap_or(&choices[0]);

        let content = choice
            .get("message")
            .and_then(|m| m.get("content"))
            .ok_or_else(|| OrchestratorError::provider(None, "No message content in completion choice"))?;

        let text = match content {
            Value::String(s) => s.clone(),
            Value::Array(blocks) => blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        };

        let usage = response.get("usage").and_then(TokenUsage::from_usage_value);
        if let Some(u) = usage {
            log::debug!(
                "{} token usage: prompt={}, completion={}, total={}",
                self.provider,
                u.prompt_tokens,
                u.completion_tokens,
                u.total_tokens
            );
        }

        Ok(TransportResponse { text, usage })
    }
}

/// Pull the human-readable message out of an error payload, if any.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str().map(String::from))
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown".to_string()
            } else {
                truncate_chars(body, 500)
            }
        })
}

#[async_trait]
impl GenerationTransport for OpenAiCompatibleTransport {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(
        &self,
        messages: &[ConversationMessage],
        config: &SamplingConfig,
    ) -> Result<TransportResponse> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            OrchestratorError::provider(
                None,
                format!("API key for provider '{}' is not set", self.provider),
            )
        })?;

        let body = self.build_request_body(messages, config);
        let endpoint = format!("{}/chat/completions", self.base_url);

        log::debug!(
            "{} request: model={}, messages={}, temperature={}, top_p={}",
            self.provider,
            self.model,
            messages.len(),
            config.temperature,
            config.top_p
        );

        let mut request = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key));

        if let Some(ref org) = self.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request.json(&body).send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(OrchestratorError::provider(
                Some(status.as_u16()),
                error_message(&response_text),
            ));
        }

        let response_json: Value = serde_json::from_str(&response_text).map_err(|e| {
            OrchestratorError::provider(
                Some(status.as_u16()),
                format!(
                    "Failed to parse {} response: {} - Body: {}",
                    self.provider,
                    e,
                    truncate_chars(&response_text, 500)
                ),
            )
        })?;

        self.parse_response(&response_json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
