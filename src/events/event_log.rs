//! Append-only, in-memory event log owned by one agent.

use serde_json::Value;

use crate::events::base_event::{EventLogEntry, EventType};

/// Ordered record of lifecycle events.
///
/// Entries are only ever appended; the whole log is dropped by [`EventLog::clear`].
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<EventLogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry and return a copy of it.
    pub fn append(&mut self, event_type: EventType, payload: Value, agent_id: &str) -> EventLogEntry {
        let entry = EventLogEntry::new(event_type, payload, agent_id);
        log::debug!("[Agent {}] Event: {} {}", agent_id, entry.event_type, entry.payload);
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    /// Entries of one type, in append order.
    pub fn of_type<'a>(&'a self, event_type: &'a EventType) -> impl Iterator<Item = &'a EventLogEntry> + 'a {
        self.entries.iter().filter(move |e| &e.event_type == event_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
