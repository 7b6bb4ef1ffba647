//! Creative task: the unit of work handed to a pipeline run.
//!
//! A task owns its conversation for the duration of one run. Anchors are
//! short concepts every explored idea should ladder back to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llms::base_llm::ConversationMessage;
use crate::utilities::errors::{OrchestratorError, Result};

/// Fidelity class of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    #[default]
    Creative,
    /// Drift is clamped and divergence intensity reduced.
    Factual,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creative => "creative",
            Self::Factual => "factual",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "creative" => Ok(Self::Creative),
            "factual" => Ok(Self::Factual),
            other => Err(OrchestratorError::InvalidTask(format!(
                "Unsupported task type '{}'; expected 'creative' or 'factual'",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for TaskType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Conversation plus creative constraints for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeTask {
    pub messages: Vec<ConversationMessage>,
    #[serde(default)]
    pub anchors: Vec<String>,
    #[serde(default, alias = "taskType")]
    pub task_type: TaskType,
}

impl CreativeTask {
    pub fn new(messages: Vec<ConversationMessage>) -> Self {
        Self {
            messages,
            anchors: Vec::new(),
            task_type: TaskType::Creative,
        }
    }

    /// Single user message task.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![ConversationMessage::user(prompt)])
    }

    pub fn with_anchors<I, S>(mut self, anchors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anchors = anchors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    /// Parse a task from JSON; every shape problem is an `InvalidTask`.
    pub fn from_json(value: &Value) -> Result<Self> {
        if value.get("messages").is_none() {
            return Err(OrchestratorError::InvalidTask("task is missing 'messages'".into()));
        }
        let task: Self =
            serde_json::from_value(value.clone()).map_err(|e| OrchestratorError::InvalidTask(e.to_string()))?;
        task.validate()?;
        Ok(task)
    }

    /// Messages must be present, non-empty and each carry content.
    pub fn validate(&self) -> Result<()> {
        if self.messages.is_empty() {
            return Err(OrchestratorError::InvalidTask("task has no messages".into()));
        }
        if let Some(index) = self.messages.iter().position(|m| !m.is_well_formed()) {
            return Err(OrchestratorError::InvalidTask(format!(
                "task message {} has empty content",
                index
            )));
        }
        Ok(())
    }

    pub fn is_factual(&self) -> bool {
        self.task_type == TaskType::Factual
    }
}
