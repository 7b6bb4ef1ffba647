//! Creative Pipeline: Explore → Curate → Converge.
//!
//! ```text
//! task ─→ Explore  n = max(variants, min_explore) prompts, temperature = base × 1.15 (≤ backend max)
//!      ─→ Curate   DiversitySelector, target = clamp(variants / 2, min, max)
//!      ─→ Converge one refinement per curated candidate, temperature = base × 0.85
//!      ─→ final near-duplicate pass
//! ```
//!
//! Phases always run in this order. Individual call failures become
//! [`GenerationOutcome::Degraded`] entries and never abort the run; only
//! task validation fails the whole run, and it does so before any I/O.

use serde::Serialize;

use crate::agent::{GenerationAgent, GenerationRequest};
use crate::diversity::DiversitySelector;
use crate::events::EventType;
use crate::llms::base_llm::{ConversationMessage, Role};
use crate::pipeline::batch::{dispatch_batched, BatchPolicy};
use crate::pipeline::phrases::{
    clamp_to_anchors, divergence_phrase, refinement_directive, with_anchors, CONVERGE_ANCHOR_STRENGTH,
};
use crate::task::CreativeTask;
use crate::types::outcome::GenerationOutcome;
use crate::utilities::config::PipelineConfig;
use crate::utilities::errors::{OrchestratorError, Result};

/// Phase label for explore calls.
pub const PHASE_EXPLORE: &str = "explore";
/// Phase label for the curation step.
pub const PHASE_CURATE: &str = "curate";
/// Phase label for converge calls.
pub const PHASE_CONVERGE: &str = "converge";

/// Per-run options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Requested number of variants; the configured default when absent.
    pub variant_count: Option<usize>,
}

impl RunOptions {
    pub fn with_variants(variant_count: usize) -> Self {
        Self {
            variant_count: Some(variant_count),
        }
    }
}

/// Explore prompts plus the parameters they were built with.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorePlan {
    pub prompts: Vec<Vec<ConversationMessage>>,
    pub temperature: f64,
    pub intensity: f64,
    pub drift: f64,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Final refined variants, in order.
    pub outputs: Vec<GenerationOutcome>,
    pub explored: Vec<GenerationOutcome>,
    pub curated: Vec<GenerationOutcome>,
    pub explore_calls: usize,
    pub converge_calls: usize,
    pub explore_intensity: f64,
    pub converge_intensity: f64,
    pub drift: f64,
}

impl PipelineResult {
    /// Final outputs as display strings (degraded entries as placeholders).
    pub fn texts(&self) -> Vec<String> {
        self.outputs.iter().map(GenerationOutcome::display_text).collect()
    }

    /// Final outputs that were actually generated.
    pub fn successful_texts(&self) -> Vec<&str> {
        self.outputs.iter().filter_map(GenerationOutcome::text).collect()
    }
}

enum ConvergeItem {
    Refine(Vec<ConversationMessage>),
    PassThrough(GenerationOutcome),
}

/// Stateless-per-run orchestrator over one [`GenerationAgent`].
#[derive(Debug, Clone, Default)]
pub struct CreativePipeline {
    config: PipelineConfig,
    selector: DiversitySelector,
}

impl CreativePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let selector = DiversitySelector::new(config.selector.clone());
        Self { config, selector }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn batch_policy(&self) -> BatchPolicy {
        BatchPolicy::new(self.config.batch_size, self.config.batch_delay())
    }

    /// Divergence intensity for explore; reduced for factual tasks.
    pub fn explore_intensity(&self, task: &CreativeTask) -> f64 {
        self.scaled_intensity(self.config.explore_intensity(), task)
    }

    /// Divergence intensity for converge; reduced for factual tasks.
    pub fn converge_intensity(&self, task: &CreativeTask) -> f64 {
        self.scaled_intensity(self.config.converge_intensity(), task)
    }

    fn scaled_intensity(&self, intensity: f64, task: &CreativeTask) -> f64 {
        if task.is_factual() {
            intensity * self.config.factual_intensity_factor
        } else {
            intensity
        }
    }

    /// Semantic drift allowed for `task`; clamped for factual tasks.
    pub fn effective_drift(&self, task: &CreativeTask, drift: f64) -> f64 {
        if task.is_factual() {
            drift.min(self.config.factual_drift_ceiling)
        } else {
            drift
        }
    }

    /// Build the explore prompts for `task`.
    ///
    /// Each prompt is the task conversation with a divergence phrase appended
    /// to the trailing user message, or appended as a new user message when
    /// the conversation does not end with one.
    pub fn plan_explore(
        &self,
        task: &CreativeTask,
        drift: f64,
        variant_count: usize,
        base_temperature: f64,
        max_temperature: f64,
    ) -> ExplorePlan {
        let drift = self.effective_drift(task, drift);
        let intensity = self.explore_intensity(task);
        let temperature = (base_temperature * self.config.explore_temperature_factor).min(max_temperature);
        let count = variant_count.max(self.config.min_explore_variants);
        let anchor_strength = 1.0 - drift;

        let prompts = (0..count)
            .map(|i| {
                let phrase = divergence_phrase(i, intensity, drift);
                let mut messages = task.messages.clone();
                match messages.last_mut() {
                    Some(last) if last.role == Role::User => {
                        let combined = format!("{}\n\n{}", last.content, phrase);
                        last.content = with_anchors(&combined, &task.anchors, anchor_strength);
                    }
                    _ => messages.push(ConversationMessage::user(with_anchors(
                        &phrase,
                        &task.anchors,
                        anchor_strength,
                    ))),
                }
                messages
            })
            .collect();

        ExplorePlan {
            prompts,
            temperature,
            intensity,
            drift,
        }
    }

    /// Whether converge directives for `task` get the configured tone.
    pub fn tone_applies(&self, task: &CreativeTask) -> bool {
        self.config.tone.is_some() && (!task.is_factual() || self.config.enable_tone_on_factual)
    }

    /// Converge conversation for one curated candidate.
    ///
    /// The directive is styled with the configured tone when
    /// [`tone_applies`](Self::tone_applies), then wrapped with the anchors.
    pub fn converge_prompt(&self, task: &CreativeTask, index: usize, candidate: &str) -> Vec<ConversationMessage> {
        let mut directive = refinement_directive(index, self.converge_intensity(task));
        if let Some(tone) = self.config.tone.filter(|_| self.tone_applies(task)) {
            directive = tone.apply(&directive, index);
        }
        let mut messages = task.messages.clone();
        messages.push(ConversationMessage::assistant(candidate));
        messages.push(ConversationMessage::user(with_anchors(
            &directive,
            &task.anchors,
            CONVERGE_ANCHOR_STRENGTH,
        )));
        messages
    }

    /// Run all three phases for `task` on `agent`.
    pub async fn run(&self, agent: &GenerationAgent, task: CreativeTask, options: RunOptions) -> Result<PipelineResult> {
        task.validate()?;
        let variant_count = options.variant_count.unwrap_or(self.config.default_variant_count);
        if variant_count == 0 {
            return Err(OrchestratorError::InvalidTask("variant_count must be greater than zero".into()));
        }

        let base_temperature = agent.sampling().temperature;
        let max_temperature = agent.max_temperature();
        let policy = self.batch_policy();

        // Explore
        let plan = self.plan_explore(
            &task,
            agent.session().semantic_drift,
            variant_count,
            base_temperature,
            max_temperature,
        );
        let explore_calls = plan.prompts.len();
        let explore_temperature = plan.temperature;

        log::info!(
            "Explore: {} prompts, temperature={:.2}, intensity={:.2}, drift={:.2}",
            explore_calls,
            explore_temperature,
            plan.intensity,
            plan.drift
        );

        let explored = dispatch_batched(plan.prompts, policy, |_, messages| async move {
            let request = GenerationRequest::new(messages)
                .temperature(explore_temperature)
                .phase(PHASE_EXPLORE);
            outcome_of(agent.generate(request).await)
        })
        .await;
        log_phase(agent, PHASE_EXPLORE, &explored);

        // Curate
        let target = self.selector.target_for(variant_count);
        let curated = self.selector.select(&explored, target);
        log::info!("Curate: {} -> {} candidates", explored.len(), curated.len());
        log_phase(agent, PHASE_CURATE, &curated);

        // Converge
        let converge_intensity = self.converge_intensity(&task);
        let converge_temperature =
            (base_temperature * self.config.converge_temperature_factor).min(max_temperature);
        let adherence = 1.0 - plan.drift;
        let items: Vec<ConvergeItem> = curated
            .iter()
            .enumerate()
            .map(|(i, candidate)| match candidate.text() {
                Some(text) => {
                    let anchored = clamp_to_anchors(text, &task.anchors, adherence);
                    ConvergeItem::Refine(self.converge_prompt(&task, i, &anchored))
                }
                None => ConvergeItem::PassThrough(candidate.clone()),
            })
            .collect();
        let converge_calls = items.iter().filter(|i| matches!(i, ConvergeItem::Refine(_))).count();

        log::info!(
            "Converge: {} refinements, temperature={:.2}, intensity={:.2}",
            converge_calls,
            converge_temperature,
            converge_intensity
        );

        let converged = dispatch_batched(items, policy, |_, item| async move {
            match item {
                ConvergeItem::PassThrough(outcome) => outcome,
                ConvergeItem::Refine(messages) => {
                    let request = GenerationRequest::new(messages)
                        .temperature(converge_temperature)
                        .phase(PHASE_CONVERGE);
                    outcome_of(agent.generate(request).await)
                }
            }
        })
        .await;

        let outputs = self.selector.dedup_outcomes(&converged);
        log_phase(agent, PHASE_CONVERGE, &outputs);

        Ok(PipelineResult {
            outputs,
            explored,
            curated,
            explore_calls,
            converge_calls,
            explore_intensity: plan.intensity,
            converge_intensity,
            drift: plan.drift,
        })
    }
}

fn outcome_of(result: Result<crate::agent::GenerationResult>) -> GenerationOutcome {
    match result {
        Ok(generated) => GenerationOutcome::Ok(generated.text),
        Err(err) => GenerationOutcome::from(&err),
    }
}

fn log_phase(agent: &GenerationAgent, phase: &str, outcomes: &[GenerationOutcome]) {
    let degraded = outcomes.iter().filter(|o| o.is_degraded()).count();
    agent.log_event(
        EventType::PhaseCompleted,
        serde_json::json!({
            "phase": phase,
            "count": outcomes.len(),
            "degraded": degraded,
        }),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SessionUpdate;
    use crate::llms::sampling::SamplingOverrides;
    use crate::llms::testing::{distinct_response, failing_at, ScriptedTransport};
    use crate::llms::base_llm::TransportResponse;
    use crate::task::TaskType;
    use crate::pipeline::tone::Tone;
    use crate::utilities::errors::ErrorKind;
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            batch_delay_ms: 0,
            ..Default::default()
        }
    }

    fn agent_with(transport: Arc<ScriptedTransport>, temperature: f64, drift: f64) -> GenerationAgent {
        let mut agent = GenerationAgent::new(transport);
        agent.set_sampling_config(SamplingOverrides {
            temperature: Some(temperature),
            ..Default::default()
        });
        agent.update_session_state(SessionUpdate {
            semantic_drift: Some(drift),
            ..Default::default()
        });
        agent
    }

    #[test]
    fn test_plan_explore_appends_to_trailing_user_message() {
        let pipeline = CreativePipeline::new(fast_config());
        let task = CreativeTask::from_prompt("Design a logo concept").with_anchors(["fox"]);
        let plan = pipeline.plan_explore(&task, 0.5, 2, 1.0, 2.0);

        assert_eq!(plan.prompts.len(), 4);
        assert!((plan.temperature - 1.15).abs() < 1e-9);
        for (i, prompt) in plan.prompts.iter().enumerate() {
            assert_eq!(prompt.len(), 1);
            let content = &prompt[0].content;
            assert!(content.starts_with("• Anchor: fox\n\nDesign a logo concept\n\n"));
            assert!(content.contains(&divergence_phrase(i, 0.9, 0.5)));
            assert!(content.ends_with("strength=0.50)"));
        }
    }

    #[test]
    fn test_plan_explore_adds_user_message_after_assistant() {
        let pipeline = CreativePipeline::new(fast_config());
        let task = CreativeTask::new(vec![
            ConversationMessage::user("Design a logo concept"),
            ConversationMessage::assistant("A fox."),
        ]);
        let plan = pipeline.plan_explore(&task, 0.5, 4, 1.0, 2.0);
        let prompt = &plan.prompts[0];
        assert_eq!(prompt.len(), 3);
        assert_eq!(prompt[1].content, "A fox.");
        assert_eq!(prompt[2].role, Role::User);
        assert_eq!(prompt[2].content, divergence_phrase(0, 0.9, 0.5));
    }

    #[test]
    fn test_explore_temperature_capped_by_backend() {
        let pipeline = CreativePipeline::new(fast_config());
        let task = CreativeTask::from_prompt("x");
        let plan = pipeline.plan_explore(&task, 0.5, 4, 1.35, 1.0);
        assert_eq!(plan.temperature, 1.0);
    }

    #[test]
    fn test_factual_clamps_drift_and_halves_intensity() {
        let pipeline = CreativePipeline::new(fast_config());
        let creative = CreativeTask::from_prompt("Summarise the report");
        let factual = creative.clone().with_task_type(TaskType::Factual);

        let c = pipeline.plan_explore(&creative, 0.65, 4, 1.0, 2.0);
        let f = pipeline.plan_explore(&factual, 0.65, 4, 1.0, 2.0);

        assert!(f.intensity < c.intensity);
        assert_eq!(f.intensity, 0.45);
        assert_eq!(f.drift, 0.15);
        assert_eq!(c.drift, 0.65);
        assert!(f.prompts[0][0].content.contains("divergence intensity=0.45, semantic drift=0.15"));
        assert!(pipeline.converge_intensity(&factual) < pipeline.converge_intensity(&creative));
    }

    #[tokio::test]
    async fn test_run_counts_calls_and_records_phases() {
        let transport = ScriptedTransport::distinct().into_arc();
        let agent = agent_with(transport.clone(), 1.0, 0.5);
        let pipeline = CreativePipeline::new(fast_config());

        let result = pipeline
            .run(&agent, CreativeTask::from_prompt("Design a logo concept"), RunOptions::with_variants(6))
            .await
            .unwrap();

        assert_eq!(result.explore_calls, 6);
        assert_eq!(result.curated.len(), 4);
        assert_eq!(result.converge_calls, 4);
        assert_eq!(result.outputs.len(), 4);
        assert_eq!(transport.call_count(), 10);

        let metrics = agent.metrics();
        assert_eq!(metrics.calls_for(PHASE_EXPLORE), 6);
        assert_eq!(metrics.calls_for(PHASE_CONVERGE), 4);

        let calls = transport.calls();
        assert!((calls[0].config.temperature - 1.15).abs() < 1e-9);
        assert!((calls[6].config.temperature - 0.85).abs() < 1e-9);

        // converge prompt carries the curated candidate as prior context
        let converge = &calls[6].messages;
        assert_eq!(converge[converge.len() - 2].role, Role::Assistant);
        assert_eq!(converge[converge.len() - 2].content, result.curated[0].text().unwrap());
        assert!(converge.last().unwrap().content.contains("implications"));

        let phases: Vec<_> = agent
            .events()
            .into_iter()
            .filter(|e| e.event_type == EventType::PhaseCompleted)
            .map(|e| e.payload["phase"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(phases, vec![PHASE_EXPLORE, PHASE_CURATE, PHASE_CONVERGE]);
    }

    #[tokio::test]
    async fn test_explore_failure_degrades_single_slot() {
        let transport = ScriptedTransport::with_responder(failing_at(vec![1])).into_arc();
        let agent = agent_with(transport.clone(), 1.0, 0.5);
        let pipeline = CreativePipeline::new(fast_config());

        let result = pipeline
            .run(&agent, CreativeTask::from_prompt("Design a logo concept"), RunOptions::with_variants(4))
            .await
            .unwrap();

        assert_eq!(result.explored.len(), 4);
        assert!(result.explored[1].is_degraded());
        assert!(result.curated.iter().all(GenerationOutcome::is_ok));
        assert_eq!(result.curated.len(), 3);
        assert_eq!(result.converge_calls, 3);
        assert_eq!(agent.metrics().total_calls, 3 + 3);
    }

    #[tokio::test]
    async fn test_converge_failure_surfaces_as_degraded_entry() {
        // calls 0..4 explore, 4.. converge; fail the second converge call
        let transport = ScriptedTransport::with_responder(failing_at(vec![5])).into_arc();
        let agent = agent_with(transport, 1.0, 0.5);
        let pipeline = CreativePipeline::new(fast_config());

        let result = pipeline
            .run(&agent, CreativeTask::from_prompt("Design a logo concept"), RunOptions::with_variants(4))
            .await
            .unwrap();

        assert_eq!(result.outputs.len(), 4);
        assert!(result.outputs[1].is_degraded());
        assert!(result.texts()[1].starts_with("[DEGRADED"));
        assert_eq!(result.successful_texts().len(), 3);
    }

    #[tokio::test]
    async fn test_all_explore_failures_pass_through_without_converge_calls() {
        let transport =
            ScriptedTransport::with_responder(|_, _, _| Err(OrchestratorError::provider(Some(502), "bad gateway")))
                .into_arc();
        let agent = agent_with(transport.clone(), 1.0, 0.5);
        let pipeline = CreativePipeline::new(fast_config());

        let result = pipeline
            .run(&agent, CreativeTask::from_prompt("Design a logo concept"), RunOptions::with_variants(4))
            .await
            .unwrap();

        assert!(!result.outputs.is_empty());
        assert!(result.outputs.iter().all(GenerationOutcome::is_degraded));
        assert_eq!(result.converge_calls, 0);
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test]
    async fn test_near_duplicate_converge_outputs_removed() {
        let transport = ScriptedTransport::with_responder(|i, _, _| {
            if i < 4 {
                Ok(distinct_response(i))
            } else {
                Ok(TransportResponse::new("The same refined logo idea with a fox and a moon."))
            }
        })
        .into_arc();
        let agent = agent_with(transport, 1.0, 0.5);
        let pipeline = CreativePipeline::new(fast_config());

        let result = pipeline
            .run(&agent, CreativeTask::from_prompt("Design a logo concept"), RunOptions::with_variants(4))
            .await
            .unwrap();
        assert_eq!(result.converge_calls, 4);
        assert_eq!(result.outputs.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_runs_fail_before_io() {
        let transport = ScriptedTransport::distinct().into_arc();
        let agent = agent_with(transport.clone(), 1.0, 0.5);
        let pipeline = CreativePipeline::new(fast_config());

        let err = pipeline
            .run(&agent, CreativeTask::new(vec![]), RunOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTask);

        let err = pipeline
            .run(&agent, CreativeTask::from_prompt("x"), RunOptions::with_variants(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTask);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_curated_candidates_reanchored_before_converge() {
        let transport = ScriptedTransport::with_responder(|i, _, _| {
            let echoed = format!(
                "{}\n(Ensure concepts ladder back to anchors with strength=0.50)",
                distinct_response(i).text
            );
            Ok(TransportResponse::new(echoed))
        })
        .into_arc();
        let agent = agent_with(transport.clone(), 1.0, 0.5);
        let pipeline = CreativePipeline::new(fast_config());
        let task = CreativeTask::from_prompt("Design a logo concept").with_anchors(["fox"]);

        let result = pipeline.run(&agent, task, RunOptions::with_variants(4)).await.unwrap();
        assert_eq!(result.explore_calls, 4);
        assert!(result.converge_calls > 0);

        let calls = transport.calls();
        for call in &calls[4..] {
            let candidate = &call.messages[call.messages.len() - 2];
            assert_eq!(candidate.role, Role::Assistant);
            assert!(candidate.content.contains("Adhere to anchors"));
            assert!(candidate.content.ends_with("\n\n(Adhere to anchors ≥ 50%)"));
            assert!(!candidate.content.contains("(Ensure"));
            assert!(call.messages.last().unwrap().content.starts_with("• Anchor: fox"));
        }
    }

    #[test]
    fn test_converge_directive_styled_for_creative_tasks() {
        let pipeline = CreativePipeline::new(fast_config());
        let task = CreativeTask::from_prompt("Design a logo concept");
        assert!(pipeline.tone_applies(&task));

        let plain = refinement_directive(0, pipeline.converge_intensity(&task));
        let messages = pipeline.converge_prompt(&task, 0, "A fox.");
        let directive = &messages.last().unwrap().content;
        assert_eq!(directive, &Tone::ExplorerDreamy.apply(&plain, 0));
        assert_ne!(directive, &plain);
        assert!(directive.contains("luminous idea"));
    }

    #[test]
    fn test_factual_converge_directive_plain_unless_enabled() {
        let task = CreativeTask::from_prompt("Summarise the report").with_task_type(TaskType::Factual);

        let pipeline = CreativePipeline::new(fast_config());
        assert!(!pipeline.tone_applies(&task));
        let plain = refinement_directive(1, pipeline.converge_intensity(&task));
        assert_eq!(pipeline.converge_prompt(&task, 1, "A fact.").last().unwrap().content, plain);

        let enabled = CreativePipeline::new(PipelineConfig {
            enable_tone_on_factual: true,
            ..fast_config()
        });
        assert!(enabled.tone_applies(&task));
        assert_eq!(
            enabled.converge_prompt(&task, 1, "A fact.").last().unwrap().content,
            Tone::ExplorerDreamy.apply(&plain, 1)
        );

        let untoned = CreativePipeline::new(PipelineConfig {
            tone: None,
            enable_tone_on_factual: true,
            ..fast_config()
        });
        let creative = CreativeTask::from_prompt("Design a logo concept");
        assert!(!untoned.tone_applies(&creative));
        assert_eq!(
            untoned.converge_prompt(&creative, 0, "A fox.").last().unwrap().content,
            refinement_directive(0, untoned.converge_intensity(&creative))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out_without_stalling_its_batch() {
        let transport = ScriptedTransport::distinct()
            .hanging_on(1)
            .delayed(Duration::from_millis(10))
            .into_arc();
        let agent = agent_with(transport.clone(), 1.0, 0.5).with_timeout(Duration::from_millis(50));
        let pipeline = CreativePipeline::new(fast_config());

        let result = pipeline
            .run(&agent, CreativeTask::from_prompt("Design a logo concept"), RunOptions::with_variants(4))
            .await
            .unwrap();

        // first explore batch holds calls 0..3
        assert!(result.explored[0].is_ok());
        assert!(result.explored[2].is_ok());
        match &result.explored[1] {
            GenerationOutcome::Degraded { reason } => assert!(reason.contains("timed out after 50ms")),
            other => panic!("expected a degraded slot, got {:?}", other),
        }
        assert!(result.explored[3].is_ok());
        assert_eq!(result.converge_calls, 3);
        assert_eq!(result.successful_texts().len(), 3);

        let timeouts = agent
            .events()
            .into_iter()
            .filter(|e| e.event_type == EventType::GenerationFailed && e.payload["kind"] == "Timeout")
            .count();
        assert_eq!(timeouts, 1);
    }
}
