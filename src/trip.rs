//! Trip lifecycle: the caller-facing facade.
//!
//! A trip binds one intensity level to one [`GenerationAgent`] for a while:
//!
//! ```text
//! start_trip(level, overrides)
//!   ├─ PresetTable::effects_for      (validates before touching the agent)
//!   ├─ modulate_sampling             → agent sampling defaults
//!   ├─ generate_instruction(tier)    → agent system instruction
//!   └─ update_session_state          → active, level, effects, drift
//! run_pipeline(task, options)*       → CreativePipeline::run
//! end_trip()                         → agent.restore_baseline()
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::agent::{GenerationAgent, SessionUpdate};
use crate::events::EventType;
use crate::llms::base_llm::GenerationTransport;
use crate::llms::sampling::SamplingOverrides;
use crate::persona::instruction::{generate_instruction, InstructionTier};
use crate::persona::llm_modulation::modulate_sampling;
use crate::persona::presets::{EffectOverrides, IntensityLevel, PresetTable};
use crate::pipeline::creative::{CreativePipeline, PipelineResult, RunOptions};
use crate::task::CreativeTask;
use crate::utilities::config::{OrchestratorConfig, TripConfig};
use crate::utilities::errors::{ConfigError, OrchestratorError, Result};

/// Owns the agent for the duration of one or more trips.
#[derive(Debug)]
pub struct CreativeTrip {
    agent: GenerationAgent,
    presets: Arc<PresetTable>,
    pipeline: CreativePipeline,
    trip_config: TripConfig,
}

impl CreativeTrip {
    pub fn new(agent: GenerationAgent, presets: Arc<PresetTable>) -> Self {
        Self {
            agent,
            presets,
            pipeline: CreativePipeline::default(),
            trip_config: TripConfig::default(),
        }
    }

    /// Build the agent and pipeline from a validated configuration with the
    /// standard preset table.
    pub fn from_config(
        transport: Arc<dyn GenerationTransport>,
        config: &OrchestratorConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let agent = GenerationAgent::from_config(transport, &config.agent);
        Ok(Self::new(agent, Arc::new(PresetTable::standard()))
            .with_pipeline(CreativePipeline::new(config.pipeline.clone()))
            .with_trip_config(config.trip.clone()))
    }

    pub fn with_pipeline(mut self, pipeline: CreativePipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_trip_config(mut self, trip_config: TripConfig) -> Self {
        self.trip_config = trip_config;
        self
    }

    pub fn agent(&self) -> &GenerationAgent {
        &self.agent
    }

    pub fn into_agent(self) -> GenerationAgent {
        self.agent
    }

    pub fn presets(&self) -> &PresetTable {
        &self.presets
    }

    pub fn is_active(&self) -> bool {
        self.agent.session().active
    }

    /// Apply the preset for `level` to the agent.
    ///
    /// Fails with `InvalidIntensity` on an unknown level or a bad override,
    /// leaving the agent untouched. Starting over an active trip re-applies
    /// the new level in place.
    pub fn start_trip(&mut self, level: IntensityLevel, overrides: &EffectOverrides) -> Result<()> {
        let preset = *self.presets.preset_for(level)?;
        let effects = self.presets.effects_for(level, overrides)?;

        let drift = self.trip_config.semantic_drift.unwrap_or(preset.semantic_drift);
        let tier = self
            .trip_config
            .instruction_tier
            .unwrap_or_else(|| InstructionTier::for_level(level));
        let sampling = modulate_sampling(&preset.sampling, &effects);
        let instruction = generate_instruction(&effects, drift, tier);

        if self.is_active() {
            log::info!("[Trip] Re-applying trip at intensity '{}'", level);
        }

        self.agent.set_sampling_config(SamplingOverrides::from(sampling));
        self.agent.set_system_instruction(instruction);
        self.agent.update_session_state(SessionUpdate {
            intensity_level: Some(level),
            effects: Some(effects),
            semantic_drift: Some(drift),
            started_at: Some(Utc::now()),
        });

        self.agent.log_event(
            EventType::TripStarted,
            json!({
                "level": level.as_str(),
                "tier": tier.to_string(),
                "semantic_drift": drift,
                "temperature": sampling.temperature,
                "top_p": sampling.top_p,
            }),
        );
        log::info!(
            "[Trip] Started at intensity '{}' (tier={}, temperature={:.2}, drift={:.2})",
            level,
            tier,
            sampling.temperature,
            drift
        );
        Ok(())
    }

    /// Return the agent to baseline. A no-op when no trip is active.
    pub fn end_trip(&mut self) {
        if !self.is_active() {
            return;
        }
        let session = self.agent.session().clone();
        let duration_ms = session
            .started_at
            .map(|started| (Utc::now() - started).num_milliseconds())
            .unwrap_or(0);

        self.agent.log_event(
            EventType::TripEnded,
            json!({
                "level": session.intensity_level.map(|l| l.as_str()),
                "duration_ms": duration_ms,
                "total_calls": self.agent.metrics().total_calls,
            }),
        );
        self.agent.restore_baseline();
        log::info!("[Trip] Ended after {}ms", duration_ms);
    }

    /// Run the creative pipeline under the active trip.
    pub async fn run_pipeline(&self, task: CreativeTask, options: RunOptions) -> Result<PipelineResult> {
        if !self.is_active() {
            return Err(OrchestratorError::InvalidTask(
                "no active trip; call start_trip first".into(),
            ));
        }
        self.pipeline.run(&self.agent, task, options).await
    }

    /// Start a trip, run one pipeline, and end the trip whatever the outcome.
    pub async fn with_trip(
        &mut self,
        level: IntensityLevel,
        overrides: &EffectOverrides,
        task: CreativeTask,
        options: RunOptions,
    ) -> Result<PipelineResult> {
        self.start_trip(level, overrides)?;
        let result = self.run_pipeline(task, options).await;
        self.end_trip();
        result
    }
}
