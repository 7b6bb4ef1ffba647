//! Scripted in-memory transport used by unit tests across the crate.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::llms::base_llm::{ConversationMessage, GenerationTransport, TokenUsage, TransportResponse};
use crate::llms::sampling::{SamplingConfig, MAX_TEMPERATURE};
use crate::utilities::errors::{OrchestratorError, Result};

type Responder =
    dyn Fn(usize, &[ConversationMessage], &SamplingConfig) -> Result<TransportResponse> + Send + Sync;

/// One call observed by a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub messages: Vec<ConversationMessage>,
    pub config: SamplingConfig,
}

/// Transport that records calls and answers from a closure.
pub(crate) struct ScriptedTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
    hang: bool,
    hang_on: Vec<usize>,
    max_temperature: f64,
}

impl fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("calls", &self.calls.lock().len())
            .field("delay", &self.delay)
            .field("hang", &self.hang)
            .field("hang_on", &self.hang_on)
            .finish()
    }
}

impl ScriptedTransport {
    /// Answers every call with text whose token set is unique to the call index.
    pub fn distinct() -> Self {
        Self::with_responder(|index, _, _| Ok(distinct_response(index)))
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(usize, &[ConversationMessage], &SamplingConfig) -> Result<TransportResponse>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            delay: None,
            hang: false,
            hang_on: Vec::new(),
            max_temperature: MAX_TEMPERATURE,
        }
    }

    /// Never answers.
    pub fn hanging() -> Self {
        let mut transport = Self::distinct();
        transport.hang = true;
        transport
    }

    /// Never answers the call with this index; other calls are unaffected.
    pub fn hanging_on(mut self, index: usize) -> Self {
        self.hang_on.push(index);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_max_temperature(mut self, max: f64) -> Self {
        self.max_temperature = max;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl GenerationTransport for ScriptedTransport {
    fn provider(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn max_temperature(&self) -> f64 {
        self.max_temperature
    }

    async fn send(
        &self,
        messages: &[ConversationMessage],
        config: &SamplingConfig,
    ) -> Result<TransportResponse> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                config: *config,
            });
            calls.len() - 1
        };

        if self.hang || self.hang_on.contains(&index) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.responder)(index, messages, config)
    }
}

/// Response whose tokens do not overlap with any other call index.
pub(crate) fn distinct_response(index: usize) -> TransportResponse {
    let words: Vec<String> = ["concept", "shape", "palette", "motif", "story", "texture"]
        .iter()
        .map(|w| format!("{}{}", w, index))
        .collect();
    TransportResponse::new(format!("Idea {}: {}.", index, words.join(" "))).with_usage(TokenUsage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// Responder that fails for the given call indices and answers distinctly otherwise.
pub(crate) fn failing_at(
    indices: Vec<usize>,
) -> impl Fn(usize, &[ConversationMessage], &SamplingConfig) -> Result<TransportResponse> + Send + Sync
{
    move |index, _, _| {
        if indices.contains(&index) {
            Err(OrchestratorError::provider(Some(500), "backend exploded"))
        } else {
            Ok(distinct_response(index))
        }
    }
}
