//! Lifecycle events recorded by the generation agent.
//!
//! Events are plain records appended to a per-agent [`EventLog`]; there is no
//! global bus and no listener dispatch. Callers read them back through
//! [`GenerationAgent::events`](crate::agent::GenerationAgent::events).

pub mod base_event;
pub mod event_log;

pub use base_event::{EventLogEntry, EventType};
pub use event_log::EventLog;
