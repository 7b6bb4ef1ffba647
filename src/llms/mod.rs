//! Generation backends.
//!
//! - [`base_llm`] - the [`GenerationTransport`] capability and message types
//! - [`sampling`] - sampling parameters and their partial overrides
//! - [`providers`] - HTTP transports (OpenAI-compatible, Anthropic)

pub mod base_llm;
pub mod providers;
pub mod sampling;

#[cfg(test)]
pub(crate) mod testing;

pub use base_llm::{
    ConversationMessage, GenerationTransport, Role, TokenUsage, TransportResponse,
};
pub use sampling::{SamplingConfig, SamplingOverrides};
