//! Role profile: a named system-level instruction block.
//!
//! A profile is only ever held in a validated state: both `role` and
//! `content` are non-blank. Deserialisation goes through the same check, so
//! a JSON object missing a field is rejected rather than defaulted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utilities::errors::{OrchestratorError, Result};

/// Validated `{role, content}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProfile")]
pub struct RoleProfile {
    role: String,
    content: String,
}

/// Unvalidated wire shape; absent fields read as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProfile {
    role: String,
    content: String,
}

impl TryFrom<RawProfile> for RoleProfile {
    type Error = OrchestratorError;

    fn try_from(raw: RawProfile) -> Result<Self> {
        RoleProfile::new(raw.role, raw.content)
    }
}

impl RoleProfile {
    /// Build a profile; fails with `InvalidProfile` when either field is blank.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Result<Self> {
        let role = role.into();
        let content = content.into();
        if role.trim().is_empty() {
            return Err(OrchestratorError::InvalidProfile("profile role must not be empty".into()));
        }
        if content.trim().is_empty() {
            return Err(OrchestratorError::InvalidProfile(
                "profile content must not be empty".into(),
            ));
        }
        Ok(Self { role, content })
    }

    /// Parse a profile from a JSON object.
    pub fn from_json(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(OrchestratorError::InvalidProfile(
                "profile must be a JSON object".into(),
            ));
        }
        let raw: RawProfile = serde_json::from_value(value.clone())
            .map_err(|e| OrchestratorError::InvalidProfile(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
