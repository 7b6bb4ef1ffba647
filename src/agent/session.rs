//! Trip (session) state held by the generation agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persona::presets::{EffectBundle, IntensityLevel};

/// What the agent knows about the trip it is serving.
///
/// Only the trip lifecycle writes this, through
/// [`GenerationAgent::update_session_state`](crate::agent::GenerationAgent::update_session_state).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub active: bool,
    pub intensity_level: Option<IntensityLevel>,
    pub effects: Option<EffectBundle>,
    pub semantic_drift: f64,
    pub started_at: Option<DateTime<Utc>>,
}

/// Partial session update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub intensity_level: Option<IntensityLevel>,
    pub effects: Option<EffectBundle>,
    pub semantic_drift: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Apply `update` and mark the session active.
    pub fn apply(&mut self, update: SessionUpdate) {
        if let Some(level) = update.intensity_level {
            self.intensity_level = Some(level);
        }
        if let Some(effects) = update.effects {
            self.effects = Some(effects);
        }
        if let Some(drift) = update.semantic_drift {
            self.semantic_drift = drift;
        }
        if let Some(started_at) = update.started_at {
            self.started_at = Some(started_at);
        }
        self.active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_forces_active_and_keeps_absent_fields() {
        let mut state = SessionState::default();
        assert!(!state.active);

        state.apply(SessionUpdate {
            intensity_level: Some(IntensityLevel::Deep),
            semantic_drift: Some(0.5),
            ..Default::default()
        });
        assert!(state.active);
        assert_eq!(state.intensity_level, Some(IntensityLevel::Deep));

        state.apply(SessionUpdate {
            semantic_drift: Some(0.15),
            ..Default::default()
        });
        assert_eq!(state.intensity_level, Some(IntensityLevel::Deep));
        assert_eq!(state.semantic_drift, 0.15);
        assert!(state.effects.is_none());
    }
}
