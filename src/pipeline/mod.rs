//! Three-phase creative pipeline.
//!
//! - [`phrases`] - divergence / refinement prompt text and anchor wrapping
//! - [`tone`] - deterministic voice styling for converge directives
//! - [`batch`] - bounded-concurrency dispatch with inter-batch delay
//! - [`creative`] - Explore → Curate → Converge orchestration

pub mod batch;
pub mod creative;
pub mod phrases;
pub mod tone;

pub use batch::{dispatch_batched, BatchPolicy};
pub use creative::{CreativePipeline, ExplorePlan, PipelineResult, RunOptions};
pub use tone::Tone;
