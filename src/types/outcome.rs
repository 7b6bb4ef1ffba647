//! Tagged result of one pipeline generation slot.

use serde::{Deserialize, Serialize};

use crate::utilities::errors::OrchestratorError;

/// A generated text, or the reason the slot has none.
///
/// A failed call never aborts a batch; it becomes `Degraded` and keeps its
/// position so later phases see a full-length collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    Ok(String),
    Degraded { reason: String },
}

impl GenerationOutcome {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Generated text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Ok(text) => Some(text),
            Self::Degraded { .. } => None,
        }
    }

    /// Text for display: the generation, or a `[DEGRADED: …]` placeholder.
    pub fn display_text(&self) -> String {
        match self {
            Self::Ok(text) => text.clone(),
            Self::Degraded { reason } => format!("[DEGRADED: {}]", reason),
        }
    }
}

impl From<&OrchestratorError> for GenerationOutcome {
    fn from(err: &OrchestratorError) -> Self {
        Self::degraded(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ok = GenerationOutcome::Ok("idea".into());
        assert!(ok.is_ok());
        assert_eq!(ok.text(), Some("idea"));
        assert_eq!(ok.display_text(), "idea");

        let bad = GenerationOutcome::from(&OrchestratorError::provider(Some(503), "overloaded"));
        assert!(bad.is_degraded());
        assert_eq!(bad.text(), None);
        assert_eq!(bad.display_text(), "[DEGRADED: Provider error (503): overloaded]");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(GenerationOutcome::degraded("timeout")).unwrap();
        assert_eq!(json, serde_json::json!({"degraded": {"reason": "timeout"}}));
        let json = serde_json::to_value(GenerationOutcome::Ok("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({"ok": "x"}));
    }
}
