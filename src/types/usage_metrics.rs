//! Per-agent call accounting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::llms::base_llm::TokenUsage;

/// Monotonic call and token counters for one generation agent.
///
/// Only successfully completed calls are counted; a timed-out or failed call
/// leaves the record untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Number of successful generation calls.
    pub total_calls: u64,
    /// Sum of backend-reported total tokens.
    pub total_tokens_consumed: u64,
    /// Successful calls keyed by pipeline phase label.
    pub calls_by_phase: BTreeMap<String, u64>,
}

impl MetricsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one completed call.
    pub fn record_call(&mut self, phase: &str, usage: Option<&TokenUsage>) {
        self.total_calls += 1;
        if let Some(usage) = usage {
            self.total_tokens_consumed += usage.total_tokens;
        }
        *self.calls_by_phase.entry(phase.to_string()).or_insert(0) += 1;
    }

    /// Calls recorded for `phase` (0 when never seen).
    pub fn calls_for(&self, phase: &str) -> u64 {
        self.calls_by_phase.get(phase).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_call_with_and_without_usage() {
        let mut m = MetricsRecord::new();
        m.record_call(
            "explore",
            Some(&TokenUsage {
                prompt_tokens: 4,
                completion_tokens: 6,
                total_tokens: 10,
            }),
        );
        m.record_call("explore", None);
        m.record_call("converge", None);

        assert_eq!(m.total_calls, 3);
        assert_eq!(m.total_tokens_consumed, 10);
        assert_eq!(m.calls_for("explore"), 2);
        assert_eq!(m.calls_for("converge"), 1);
        assert_eq!(m.calls_for("unknown"), 0);
    }
}
