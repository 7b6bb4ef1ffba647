//! Generation transport implementations.
//!
//! | Provider | Module | Wire format |
//! |----------|--------|-------------|
//! | OpenAI | [`openai`] | Chat Completions |
//! | xAI | [`openai`] | Chat Completions (different base URL) |
//! | Anthropic | [`anthropic`] | Messages |
//!
//! [`create_transport`] is the only place a provider name is turned into a
//! transport; the orchestrator itself depends on
//! [`GenerationTransport`](crate::llms::base_llm::GenerationTransport) only.

pub mod anthropic;
pub mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::llms::base_llm::GenerationTransport;

pub use anthropic::AnthropicTransport;
pub use openai::OpenAiCompatibleTransport;

/// Backends with a built-in transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Xai,
    Anthropic,
}

impl ProviderKind {
    /// Model used when the caller does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Xai => "grok-4-1-fast-reasoning",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenAi => "openai",
            Self::Xai => "xai",
            Self::Anthropic => "anthropic",
        };
        f.write_str(name)
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "xai" | "grok" => Ok(Self::Xai),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(format!("Unsupported provider: {}", other)),
        }
    }
}

/// Build a transport for `kind`; API keys fall back to the provider's env var.
pub fn create_transport(
    kind: ProviderKind,
    model: Option<String>,
    api_key: Option<String>,
) -> Arc<dyn GenerationTransport> {
    let model = model.unwrap_or_else(|| kind.default_model().to_string());
    match kind {
        ProviderKind::OpenAi => Arc::new(OpenAiCompatibleTransport::openai(model, api_key)),
        ProviderKind::Xai => Arc::new(OpenAiCompatibleTransport::xai(model, api_key)),
        ProviderKind::Anthropic => Arc::new(AnthropicTransport::new(model, api_key, None)),
    }
}
