//! Event log entries recorded by the generation agent.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kinds of lifecycle events an agent records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TripStarted,
    TripEnded,
    PhaseCompleted,
    GenerationFailed,
    /// Caller-defined event type.
    Custom(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::TripStarted => "trip_started",
            Self::TripEnded => "trip_ended",
            Self::PhaseCompleted => "phase_completed",
            Self::GenerationFailed => "generation_failed",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub event_id: String,
    pub event_type: EventType,
    pub payload: Value,
    pub agent_id: String,
    pub timestamp: DateTime<Utc>,
}

impl EventLogEntry {
    /// Stamp a new entry with a fresh id and the current UTC time.
    pub fn new(event_type: EventType, payload: Value, agent_id: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type,
            payload,
            agent_id: agent_id.into(),
            timestamp: Utc::now(),
        }
    }
}
