//! Generation transport abstraction.
//!
//! Defines the single capability the orchestrator consumes from its
//! environment: send an ordered conversation plus sampling parameters to a
//! backend and get a completion back. Every backend implements
//! [`GenerationTransport`]; the agent never branches on a provider name.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::llms::sampling::{SamplingConfig, MAX_TEMPERATURE};
use crate::utilities::errors::Result;

// ---------------------------------------------------------------------------
// Conversation messages
// ---------------------------------------------------------------------------

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// A message is well formed when its content is not blank.
    pub fn is_well_formed(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Token counts reported by a backend for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Extract usage from a provider `usage` object in a provider-agnostic way.
    ///
    /// Understands OpenAI (`prompt_tokens`/`completion_tokens`/`total_tokens`)
    /// and Anthropic (`input_tokens`/`output_tokens`) field names. Returns
    /// `None` when the object carries no recognisable counter.
    pub fn from_usage_value(usage: &Value) -> Option<Self> {
        let read = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| usage.get(*k).and_then(|v| v.as_u64()))
        };

        let prompt = read(&["prompt_tokens", "input_tokens", "prompt_token_count"]);
        let completion = read(&["completion_tokens", "output_tokens", "candidates_token_count"]);
        let total = read(&["total_tokens", "total_token_count"]);

        if prompt.is_none() && completion.is_none() && total.is_none() {
            return None;
        }

        let prompt_tokens = prompt.unwrap_or(0);
        let completion_tokens = completion.unwrap_or(0);
        Some(Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: total.unwrap_or(prompt_tokens + completion_tokens),
        })
    }
}

/// What a transport hands back on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportResponse {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl TransportResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// A pluggable text-generation backend.
///
/// Implementations must not retry on their own and must not enforce the
/// orchestration timeout; the agent wraps every `send` in its own deadline.
/// Failures surface as [`OrchestratorError::ProviderError`](crate::utilities::errors::OrchestratorError::ProviderError)
/// carrying the backend status and message.
#[async_trait]
pub trait GenerationTransport: Send + Sync + fmt::Debug {
    /// Provider name, used in logs and agent snapshots only.
    fn provider(&self) -> &str;

    /// Model identifier requested from the backend.
    fn model(&self) -> &str;

    /// Highest temperature the backend accepts.
    fn max_temperature(&self) -> f64 {
        MAX_TEMPERATURE
    }

    /// Send one conversation with fully resolved sampling parameters.
    async fn send(
        &self,
        messages: &[ConversationMessage],
        config: &SamplingConfig,
    ) -> Result<TransportResponse>;
}

/// Generate a unique identifier for one generation call (used in logs).
pub fn generate_call_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let msg = ConversationMessage::assistant("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");

        let parsed: ConversationMessage =
            serde_json::from_value(serde_json::json!({"role": "system", "content": "x"})).unwrap();
        assert_eq!(parsed.role, Role::System);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let parsed: std::result::Result<ConversationMessage, _> =
            serde_json::from_value(serde_json::json!({"role": "tool", "content": "x"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_well_formed() {
        assert!(ConversationMessage::user("Design a logo").is_well_formed());
        assert!(!ConversationMessage::user("   ").is_well_formed());
    }

    #[test]
    fn test_usage_openai_fields() {
        let usage = TokenUsage::from_usage_value(&serde_json::json!({
            "prompt_tokens": 100,
            "completion_tokens": 50,
            "total_tokens": 150
        }))
        .unwrap();
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(usage.prompt_tokens, 100);
    }

    #[test]
    fn test_usage_anthropic_fields_sum_total() {
        let usage = TokenUsage::from_usage_value(&serde_json::json!({
            "input_tokens": 30,
            "output_tokens": 12
        }))
        .unwrap();
        assert_eq!(usage.total_tokens, 42);
    }

    #[test]
    fn test_usage_absent() {
        assert!(TokenUsage::from_usage_value(&serde_json::json!({})).is_none());
    }

    #[test]
    fn test_generate_call_id() {
        let id1 = generate_call_id();
        let id2 = generate_call_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
    }
}
