//! Persona system: intensity presets, sampling modulation, system
//! instructions and role profiles.
//!
//! # Architecture
//!
//! ```text
//! IntensityLevel ──→ PresetTable ──→ Preset { effects, sampling, semantic_drift }
//!                                        │            │
//!            EffectOverrides ──merge──→ EffectBundle  │
//!                                        │            ↓
//!                                        │   modulate_sampling → SamplingConfig
//!                                        ↓
//!                          generate_instruction(tier) → system instruction
//! ```
//!
//! Everything here is pure; the trip lifecycle pushes the results into a
//! [`GenerationAgent`](crate::agent::GenerationAgent).

pub mod instruction;
pub mod llm_modulation;
pub mod presets;
pub mod profile;

pub use instruction::{generate_instruction, InstructionTier, InstructionToggles};
pub use llm_modulation::modulate_sampling;
pub use presets::{EffectBundle, EffectOverrides, IntensityLevel, Preset, PresetTable};
pub use profile::RoleProfile;
