//! # Creative Orchestrator
//!
//! Intensity-driven creative generation on top of a pluggable LLM backend.
//!
//! A caller picks an [`IntensityLevel`]; the trip applies that level's preset
//! (sampling parameters, semantic effects and a generated system instruction)
//! to a [`GenerationAgent`], then runs a three-phase pipeline:
//!
//! ```text
//! CreativeTrip::start_trip(level)
//!     │
//!     ├─ Explore   many divergent prompts, wide sampling, batched
//!     ├─ Curate    DiversitySelector keeps a mutually dissimilar subset
//!     └─ Converge  one refinement per curated idea, narrow sampling
//!     │
//! CreativeTrip::end_trip()  → agent back to baseline
//! ```

pub mod agent;
pub mod diversity;
pub mod events;
pub mod llms;
pub mod persona;
pub mod pipeline;
pub mod task;
pub mod trip;
pub mod types;
pub mod utilities;

pub use agent::{GenerationAgent, GenerationRequest, GenerationResult};
pub use diversity::{DiversitySelector, SelectorConfig};
pub use llms::base_llm::{ConversationMessage, GenerationTransport, Role};
pub use llms::sampling::{SamplingConfig, SamplingOverrides};
pub use persona::{EffectBundle, EffectOverrides, IntensityLevel, PresetTable, RoleProfile};
pub use pipeline::{CreativePipeline, PipelineResult, RunOptions};
pub use task::{CreativeTask, TaskType};
pub use trip::CreativeTrip;
pub use types::GenerationOutcome;
pub use utilities::{OrchestratorConfig, OrchestratorError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
