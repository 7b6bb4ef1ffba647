//! Generation agent: the single point of contact with a generation backend.
//!
//! The agent owns the persistent per-session configuration:
//!
//! - sampling defaults ([`SamplingConfig`])
//! - an optional role profile and system instruction
//! - trip [`SessionState`]
//! - call metrics and an append-only event log
//!
//! Every backend call goes through [`GenerationAgent::generate`], which
//! validates the conversation, fuses the system block, resolves sampling and
//! enforces the wall-clock timeout. Configuration setters take `&mut self`
//! and `generate` takes `&self`, so configuration cannot change while a call
//! from the same agent is in flight. Metrics and events are behind
//! `parking_lot` mutexes because they are written from `generate`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::agent::session::{SessionState, SessionUpdate};
use crate::events::{EventLog, EventLogEntry, EventType};
use crate::llms::base_llm::{generate_call_id, ConversationMessage, GenerationTransport, Role, TokenUsage};
use crate::llms::sampling::{SamplingConfig, SamplingOverrides};
use crate::persona::profile::RoleProfile;
use crate::types::usage_metrics::MetricsRecord;
use crate::utilities::config::{AgentConfig, DEFAULT_TIMEOUT_SECS};
use crate::utilities::errors::{OrchestratorError, Result};

/// Separator between the parts of the fused system block.
pub const SYSTEM_BLOCK_SEPARATOR: &str = "\n---\n";

/// Phase label recorded for calls that do not name one.
pub const DEFAULT_PHASE: &str = "unknown";

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// One generation call.
///
/// Inline sampling values override the agent's defaults for this call only.
/// Penalties are not overridable inline.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub messages: Vec<ConversationMessage>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub phase: Option<String>,
}

impl GenerationRequest {
    pub fn new(messages: Vec<ConversationMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }
}

/// Successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub usage: Option<TokenUsage>,
    /// Sampling values actually sent.
    pub sampling: SamplingConfig,
    pub phase: String,
    pub call_id: String,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Read-only view of an agent's state.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub provider: String,
    pub model: String,
    pub sampling: SamplingConfig,
    pub session: SessionState,
    pub has_system_instruction: bool,
    pub has_profile: bool,
    pub metrics: MetricsRecord,
    pub event_count: usize,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Per-session facade over a [`GenerationTransport`].
pub struct GenerationAgent {
    id: String,
    transport: Arc<dyn GenerationTransport>,
    timeout: Duration,
    sampling: SamplingConfig,
    system_instruction: Option<String>,
    profile: Option<RoleProfile>,
    session: SessionState,
    metrics: Mutex<MetricsRecord>,
    events: Mutex<EventLog>,
}

impl fmt::Debug for GenerationAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationAgent")
            .field("id", &self.id)
            .field("provider", &self.transport.provider())
            .field("model", &self.transport.model())
            .field("timeout", &self.timeout)
            .field("sampling", &self.sampling)
            .field("session", &self.session)
            .finish()
    }
}

impl GenerationAgent {
    /// Create an agent with baseline sampling and the default 180 s timeout.
    pub fn new(transport: Arc<dyn GenerationTransport>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            transport,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sampling: SamplingConfig::baseline(),
            system_instruction: None,
            profile: None,
            session: SessionState::default(),
            metrics: Mutex::new(MetricsRecord::new()),
            events: Mutex::new(EventLog::new()),
        }
    }

    /// Create an agent from the `agent` configuration section.
    pub fn from_config(transport: Arc<dyn GenerationTransport>, config: &AgentConfig) -> Self {
        let mut agent = Self::new(transport).with_timeout(config.timeout());
        if let Some(ref id) = config.id {
            agent.id = id.clone();
        }
        agent
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    // ---- accessors ----

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn sampling(&self) -> &SamplingConfig {
        &self.sampling
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    pub fn profile(&self) -> Option<&RoleProfile> {
        self.profile.as_ref()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Highest temperature the underlying backend accepts.
    pub fn max_temperature(&self) -> f64 {
        self.transport.max_temperature()
    }

    // ---- setters ----

    pub fn set_system_instruction(&mut self, text: impl Into<String>) {
        self.system_instruction = Some(text.into());
    }

    pub fn clear_system_instruction(&mut self) {
        self.system_instruction = None;
    }

    /// Replace the role profile; `None` clears it.
    pub fn set_profile(&mut self, profile: Option<RoleProfile>) {
        self.profile = profile;
    }

    /// Replace the role profile from an untrusted JSON value; `null` clears it.
    ///
    /// On `InvalidProfile` the stored profile is left unchanged.
    pub fn set_profile_from_json(&mut self, value: &Value) -> Result<()> {
        let profile = if value.is_null() {
            None
        } else {
            Some(RoleProfile::from_json(value)?)
        };
        self.profile = profile;
        Ok(())
    }

    /// Merge `overrides` into the persistent sampling defaults.
    pub fn set_sampling_config(&mut self, overrides: SamplingOverrides) {
        self.sampling = self.sampling.merged(&overrides);
        log::debug!("[Agent {}] Sampling defaults: {:?}", self.id, self.sampling);
    }

    /// Merge `update` into the session state and mark it active.
    pub fn update_session_state(&mut self, update: SessionUpdate) {
        self.session.apply(update);
        log::debug!("[Agent {}] Session state: {:?}", self.id, self.session);
    }

    /// Baseline sampling, no instruction, no profile, no events, inactive session.
    ///
    /// Metrics are monotonic and survive a reset.
    pub fn reset(&mut self) {
        self.restore_baseline();
        self.profile = None;
        self.events.get_mut().clear();
        log::debug!("[Agent {}] Reset", self.id);
    }

    /// Baseline sampling, no instruction, inactive session; profile and
    /// events are kept.
    pub fn restore_baseline(&mut self) {
        self.sampling = SamplingConfig::baseline();
        self.system_instruction = None;
        self.session = SessionState::default();
    }

    // ---- events & metrics ----

    /// Append an event stamped with this agent's id.
    pub fn log_event(&self, event_type: EventType, payload: Value) -> EventLogEntry {
        self.events.lock().append(event_type, payload, &self.id)
    }

    pub fn events(&self) -> Vec<EventLogEntry> {
        self.events.lock().entries().to_vec()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn metrics(&self) -> MetricsRecord {
        self.metrics.lock().clone()
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id.clone(),
            provider: self.transport.provider().to_string(),
            model: self.transport.model().to_string(),
            sampling: self.sampling,
            session: self.session.clone(),
            has_system_instruction: self.system_instruction.is_some(),
            has_profile: self.profile.is_some(),
            metrics: self.metrics(),
            event_count: self.events.lock().len(),
        }
    }

    // ---- generation ----

    /// Sampling values for a call: inline value, else the persistent default.
    pub fn effective_sampling(&self, request: &GenerationRequest) -> SamplingConfig {
        SamplingConfig {
            temperature: request.temperature.unwrap_or(self.sampling.temperature),
            top_p: request.top_p.unwrap_or(self.sampling.top_p),
            max_tokens: request.max_tokens.unwrap_or(self.sampling.max_tokens),
            presence_penalty: self.sampling.presence_penalty,
            frequency_penalty: self.sampling.frequency_penalty,
        }
    }

    /// Prefix the conversation with the fused system block.
    ///
    /// Profile content, system instruction and the content of a leading
    /// caller system message are joined into one system message. Without any
    /// of them the conversation is returned unchanged.
    pub fn fuse_messages(&self, messages: &[ConversationMessage]) -> Vec<ConversationMessage> {
        let (leading_system, rest) = match messages.split_first() {
            Some((first, rest)) if first.role == Role::System => (Some(first.content.as_str()), rest),
            _ => (None, messages),
        };

        let parts: Vec<&str> = self
            .profile
            .as_ref()
            .map(|p| p.content())
            .into_iter()
            .chain(self.system_instruction.as_deref())
            .chain(leading_system)
            .collect();

        if parts.is_empty() {
            return messages.to_vec();
        }

        let mut fused = Vec::with_capacity(rest.len() + 1);
        fused.push(ConversationMessage::system(parts.join(SYSTEM_BLOCK_SEPARATOR)));
        fused.extend_from_slice(rest);
        fused
    }

    fn validate_messages(messages: &[ConversationMessage]) -> Result<()> {
        if messages.is_empty() {
            return Err(OrchestratorError::InvalidPrompt(
                "messages must be a non-empty sequence".into(),
            ));
        }
        if let Some(index) = messages.iter().position(|m| !m.is_well_formed()) {
            return Err(OrchestratorError::InvalidPrompt(format!(
                "message {} has empty content",
                index
            )));
        }
        Ok(())
    }

    /// Run one backend call.
    ///
    /// Fails with `InvalidPrompt` before any I/O, `Timeout` when the backend
    /// does not answer within the agent's timeout, or the transport's
    /// `ProviderError`. Nothing is retried. Metrics are only updated on success.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult> {
        Self::validate_messages(&request.messages)?;

        let sampling = self.effective_sampling(&request);
        let messages = self.fuse_messages(&request.messages);
        let phase = request.phase.unwrap_or_else(|| DEFAULT_PHASE.to_string());
        let call_id = generate_call_id();

        log::debug!(
            "[Agent {}] call {} phase={} provider={} temperature={} top_p={} max_tokens={}",
            self.id,
            call_id,
            phase,
            self.transport.provider(),
            sampling.temperature,
            sampling.top_p,
            sampling.max_tokens
        );

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.transport.send(&messages, &sampling)).await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(self.record_failure(&call_id, &phase, err)),
            Err(_) => {
                let err = OrchestratorError::Timeout { after: self.timeout };
                return Err(self.record_failure(&call_id, &phase, err));
            }
        };

        let elapsed = started.elapsed();
        self.metrics.lock().record_call(&phase, response.usage.as_ref());

        log::debug!(
            "[Agent {}] call {} completed in {}ms ({} chars)",
            self.id,
            call_id,
            elapsed.as_millis(),
            response.text.len()
        );

        Ok(GenerationResult {
            text: response.text,
            usage: response.usage,
            sampling,
            phase,
            call_id,
            elapsed,
        })
    }

    fn record_failure(&self, call_id: &str, phase: &str, err: OrchestratorError) -> OrchestratorError {
        log::warn!("[Agent {}] call {} failed: {}", self.id, call_id, err);
        self.log_event(
            EventType::GenerationFailed,
            serde_json::json!({
                "call_id": call_id,
                "phase": phase,
                "kind": err.kind().to_string(),
                "message": err.to_string(),
            }),
        );
        err
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
