//! Anthropic Messages API transport.
//!
//! Anthropic takes system text as a separate `system` parameter instead of a
//! message, caps temperature at 1.0 and has no presence/frequency penalties.

use async_trait::async_trait;
use serde_json::Value;

use crate::llms::base_llm::{
    ConversationMessage, GenerationTransport, Role, TokenUsage, TransportResponse,
};
use crate::llms::providers::openai::error_message;
use crate::llms::sampling::SamplingConfig;
use crate::utilities::errors::{OrchestratorError, Result};
use crate::utilities::string_utils::truncate_chars;

/// Default Anthropic endpoint root.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Anthropic rejects temperatures above this.
pub const ANTHROPIC_MAX_TEMPERATURE: f64 = 1.0;

/// Transport for the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicTransport {
    model: String,
    api_key: Option<String>,
    base_url: String,
    anthropic_version: String,
    client: reqwest::Client,
}

impl AnthropicTransport {
    /// Create a transport; the key defaults to `ANTHROPIC_API_KEY`.
    pub fn new(model: impl Into<String>, api_key: Option<String>, base_url: Option<String>) -> Self {
        let api_key = api_key.or_else(|| std::env::var("ANTHROPIC_API_KEY").ok());
        Self {
            model: model.into(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            anthropic_version: ANTHROPIC_VERSION.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Split system messages out of the conversation.
    ///
    /// Multiple system messages are concatenated with a blank line.
    fn extract_system_and_messages(messages: &[ConversationMessage]) -> (Option<String>, Vec<Value>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut formatted: Vec<Value> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                Role::User | Role::Assistant => formatted.push(serde_json::json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system, formatted)
    }

    /// Build the Messages API request body.
    pub fn build_request_body(&self, messages: &[ConversationMessage], config: &SamplingConfig) -> Value {
        let (system, formatted_messages) = Self::extract_system_and_messages(messages);

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": config.max_tokens,
            "messages": formatted_messages,
            "temperature": config.temperature.min(ANTHROPIC_MAX_TEMPERATURE),
            "top_p": config.top_p,
        });

        if let Some(system_text) = system {
            body["system"] = Value::String(system_text);
        }

        if config.presence_penalty != 0.0 || config.frequency_penalty != 0.0 {
            log::debug!(
                "Anthropic does not support presence/frequency penalties; ignoring presence={}, frequency={}",
                config.presence_penalty,
                config.frequency_penalty
            );
        }

        body
    }

    /// Concatenate the `text` blocks of a Messages API response.
    pub fn parse_response(response: &Value) -> Result<TransportResponse> {
        let content = response
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| OrchestratorError::provider(None, "No content array in Anthropic response"))?;

        let text = content
            .iter()
            .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n");

        let usage = response.get("usage").and_then(TokenUsage::from_usage_value);
        Ok(TransportResponse { text, usage })
    }
}

#[async_trait]
impl GenerationTransport for AnthropicTransport {
    fn provider(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_temperature(&self) -> f64 {
        ANTHROPIC_MAX_TEMPERATURE
    }

    async fn send(
        &self,
        messages: &[ConversationMessage],
        config: &SamplingConfig,
    ) -> Result<TransportResponse> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            OrchestratorError::provider(None, "Anthropic API key not set. Set ANTHROPIC_API_KEY.")
        })?;

        let body = self.build_request_body(messages, config);
        let endpoint = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-api-key", api_key.as_str())
            .header("anthropic-version", &self.anthropic_version)
            .json(&body)
            .send()
            .await?;

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
                    "Failed to parse Anthropic response: {} - Body: {}",
                    e,
                    truncate_chars(&response_text, 500)
                ),
            )
        })?;

        Self::parse_response(&response_json)
    }
}
