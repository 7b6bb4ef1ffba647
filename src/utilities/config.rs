//! Orchestrator configuration loaded from YAML.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ```yaml
//! agent:
//!   id: "studio-agent"
//!   timeout_secs: 120
//! pipeline:
//!   batch_size: 3
//!   batch_delay_ms: 500
//!   tone: explorer_dreamy
//!   selector:
//!     similarity_threshold: 0.85
//! trip:
//!   instruction_tier: balanced
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::diversity::SelectorConfig;
use crate::persona::instruction::InstructionTier;
use crate::pipeline::tone::Tone;
use crate::utilities::errors::ConfigError;

/// Wall-clock budget for one generation call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Generation agent settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Identifier stamped on every event; a UUID is generated when absent.
    pub id: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Explore/converge tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Calls dispatched concurrently per batch.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub batch_delay_ms: u64,
    pub explore_temperature_factor: f64,
    pub converge_temperature_factor: f64,
    /// Lower bound on explore prompts regardless of the requested variant count.
    pub min_explore_variants: usize,
    pub default_variant_count: usize,
    /// Drift ceiling applied to factual tasks.
    pub factual_drift_ceiling: f64,
    /// Multiplier applied to divergence intensity for factual tasks.
    pub factual_intensity_factor: f64,
    /// Divergence intensity per phase; index 0 is explore, the last is converge.
    pub weirdness_schedule: Vec<f64>,
    pub selector: SelectorConfig,
    /// Voice applied to converge directives; `None` leaves them plain.
    pub tone: Option<Tone>,
    /// Style converge directives for factual tasks too.
    pub enable_tone_on_factual: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_delay_ms: 500,
            explore_temperature_factor: 1.15,
            converge_temperature_factor: 0.85,
            min_explore_variants: 4,
            default_variant_count: 6,
            factual_drift_ceiling: 0.15,
            factual_intensity_factor: 0.5,
            weirdness_schedule: vec![0.9, 0.6, 0.25],
            selector: SelectorConfig::default(),
            tone: Some(Tone::ExplorerDreamy),
            enable_tone_on_factual: false,
        }
    }
}

impl PipelineConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Divergence intensity used while exploring.
    pub fn explore_intensity(&self) -> f64 {
        self.weirdness_schedule.first().copied().unwrap_or(0.9)
    }

    /// Divergence intensity used while converging.
    pub fn converge_intensity(&self) -> f64 {
        self.weirdness_schedule.last().copied().unwrap_or(0.25)
    }
}

/// Trip lifecycle settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripConfig {
    /// Pin the instruction tier instead of deriving it from the intensity level.
    pub instruction_tier: Option<InstructionTier>,
    /// Replace the preset's semantic drift.
    pub semantic_drift: Option<f64>,
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// Complete orchestrator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub agent: AgentConfig,
    pub pipeline: PipelineConfig,
    pub trip: TripConfig,
}

impl OrchestratorConfig {
    /// Parse and validate a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading orchestrator config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Validation(msg.to_string()));
        let p = &self.pipeline;
        let s = &p.selector;

        if self.agent.timeout_secs == 0 {
            return fail("agent.timeout_secs must be greater than zero");
        }
        if p.batch_size == 0 {
            return fail("pipeline.batch_size must be greater than zero");
        }
        if p.default_variant_count == 0 {
            return fail("pipeline.default_variant_count must be greater than zero");
        }
        if p.explore_temperature_factor <= 0.0 || p.converge_temperature_factor <= 0.0 {
            return fail("pipeline temperature factors must be positive");
        }
        if !(0.0..=1.0).contains(&p.factual_drift_ceiling) {
            return fail("pipeline.factual_drift_ceiling must be within [0, 1]");
        }
        if p.factual_intensity_factor <= 0.0 || p.factual_intensity_factor >= 1.0 {
            return fail("pipeline.factual_intensity_factor must be within (0, 1)");
        }
        if p.weirdness_schedule.is_empty() || p.weirdness_schedule.iter().any(|w| *w < 0.0) {
            return fail("pipeline.weirdness_schedule must hold non-negative values");
        }
        if s.min_candidates == 0 || s.min_candidates > s.max_candidates {
            return fail("selector requires 0 < min_candidates <= max_candidates");
        }
        if !(0.0..=1.0).contains(&s.similarity_threshold) {
            return fail("selector.similarity_threshold must be within [0, 1]");
        }
        if s.fallback_count == 0 {
            return fail("selector.fallback_count must be greater than zero");
        }
        if let Some(drift) = self.trip.semantic_drift {
            if !(0.0..=1.0).contains(&drift) {
                return fail("trip.semantic_drift must be within [0, 1]");
            }
        }
        Ok(())
    }
}
