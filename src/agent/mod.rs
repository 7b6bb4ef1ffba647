//! Generation agent.
//!
//! [`GenerationAgent`] holds the per-session configuration (sampling
//! defaults, role profile, system instruction, trip state) and exposes the
//! single call-fusion entry point [`GenerationAgent::generate`].

pub mod core;
pub mod session;

pub use self::core::{AgentSnapshot, GenerationAgent, GenerationRequest, GenerationResult};
pub use self::session::{SessionState, SessionUpdate};
