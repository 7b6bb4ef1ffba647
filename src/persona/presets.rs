//! Intensity presets: discrete creative-strength levels mapped to effect and
//! sampling bundles.
//!
//! ```text
//! IntensityLevel ─┬─ EffectBundle   (semantic effects, all magnitudes ≥ 0)
//!                 ├─ SamplingConfig (backend parameters)
//!                 └─ semantic_drift (how far prompts may wander from anchors)
//! ```
//!
//! The table is immutable once built; callers share it behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::llms::sampling::{SamplingConfig, DEFAULT_MAX_TOKENS};
use crate::utilities::errors::{OrchestratorError, Result};

/// Semantic drift used by every preset that does not set its own.
pub const DEFAULT_SEMANTIC_DRIFT: f64 = 0.5;

// ============================================================================
// IntensityLevel
// ============================================================================

/// Five-step creative-strength scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityLevel {
    Light,
    Moderate,
    Deep,
    Beyond,
    Surreal,
}

impl IntensityLevel {
    pub const ALL: [IntensityLevel; 5] = [
        Self::Light,
        Self::Moderate,
        Self::Deep,
        Self::Beyond,
        Self::Surreal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Deep => "deep",
            Self::Beyond => "beyond",
            Self::Surreal => "surreal",
        }
    }
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntensityLevel {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| OrchestratorError::InvalidIntensity(format!("Unknown intensity: {}", s)))
    }
}

// ============================================================================
// Effects
// ============================================================================

/// Semantic effect magnitudes for one intensity level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectBundle {
    pub creativity_boost: f64,
    pub cognition_flexibility: f64,
    pub memory_blend: f64,
    pub drift_intensity: f64,
    pub hallucination_factor: f64,
    /// Flag, not a magnitude.
    pub ego_dissolution: bool,
    pub decentering_score: f64,
}

impl EffectBundle {
    /// Numeric fields paired with their names.
    pub fn magnitudes(&self) -> [(&'static str, f64); 6] {
        [
            ("creativity_boost", self.creativity_boost),
            ("cognition_flexibility", self.cognition_flexibility),
            ("memory_blend", self.memory_blend),
            ("drift_intensity", self.drift_intensity),
            ("hallucination_factor", self.hallucination_factor),
            ("decentering_score", self.decentering_score),
        ]
    }

    /// Every numeric field is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.magnitudes().iter().all(|(_, v)| v.is_finite() && *v >= 0.0)
    }

    /// Field-wise merge: `override ?? self`.
    pub fn merged(&self, overrides: &EffectOverrides) -> Self {
        Self {
            creativity_boost: overrides.creativity_boost.unwrap_or(self.creativity_boost),
            cognition_flexibility: overrides
                .cognition_flexibility
                .unwrap_or(self.cognition_flexibility),
            memory_blend: overrides.memory_blend.unwrap_or(self.memory_blend),
            drift_intensity: overrides.drift_intensity.unwrap_or(self.drift_intensity),
            hallucination_factor: overrides
                .hallucination_factor
                .unwrap_or(self.hallucination_factor),
            ego_dissolution: overrides.ego_dissolution.unwrap_or(self.ego_dissolution),
            decentering_score: overrides.decentering_score.unwrap_or(self.decentering_score),
        }
    }
}

/// Caller-supplied partial effect bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creativity_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognition_flexibility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_blend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hallucination_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ego_dissolution: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decentering_score: Option<f64>,
}

impl EffectOverrides {
    /// Reject negative or non-finite numeric overrides.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("creativity_boost", self.creativity_boost),
            ("cognition_flexibility", self.cognition_flexibility),
            ("memory_blend", self.memory_blend),
            ("drift_intensity", self.drift_intensity),
            ("hallucination_factor", self.hallucination_factor),
            ("decentering_score", self.decentering_score),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(OrchestratorError::InvalidIntensity(format!(
                        "Effect override {} must be a non-negative number, got {}",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Preset table
// ============================================================================

/// Everything one intensity level prescribes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub effects: EffectBundle,
    pub sampling: SamplingConfig,
    pub semantic_drift: f64,
}

/// Immutable level → preset map.
#[derive(Debug, Clone, Default)]
pub struct PresetTable {
    presets: HashMap<IntensityLevel, Preset>,
}

impl PresetTable {
    /// The five standard presets.
    pub fn standard() -> Self {
        use IntensityLevel::*;

        #[allow(clippy::too_many_arguments)]
        fn preset(
            effects: [f64; 6],
            ego_dissolution: bool,
            temperature: f64,
            top_p: f64,
            presence_penalty: f64,
            frequency_penalty: f64,
            semantic_drift: f64,
        ) -> Preset {
            let [creativity_boost, cognition_flexibility, memory_blend, drift_intensity, hallucination_factor, decentering_score] =
                effects;
            Preset {
                effects: EffectBundle {
                    creativity_boost,
                    cognition_flexibility,
                    memory_blend,
                    drift_intensity,
                    hallucination_factor,
                    ego_dissolution,
                    decentering_score,
                },
                sampling: SamplingConfig {
                    temperature,
                    top_p,
                    max_tokens: DEFAULT_MAX_TOKENS,
                    presence_penalty,
                    frequency_penalty,
                },
                semantic_drift,
            }
        }

        let d = DEFAULT_SEMANTIC_DRIFT;
        Self::from_presets([
            (Light, preset([1.2, 1.15, 1.1, 1.05, 0.0, 0.8], false, 0.8, 0.9, 0.0, 0.0, d)),
            (Moderate, preset([1.5, 1.35, 1.2, 1.15, 0.2, 0.9], true, 0.95, 0.95, -0.1, 0.0, d)),
            (Deep, preset([1.8, 1.6, 1.35, 1.25, 0.4, 1.0], true, 1.15, 0.98, -0.2, -0.05, d)),
            (Beyond, preset([2.0, 1.8, 1.5, 1.35, 0.6, 1.1], true, 1.35, 1.0, -0.35, -0.1, d)),
            (Surreal, preset([2.2, 2.0, 1.7, 1.45, 0.75, 1.2], true, 1.55, 1.0, -0.45, -0.15, 0.65)),
        ])
    }

    /// Build a (possibly partial) custom table.
    pub fn from_presets(presets: impl IntoIterator<Item = (IntensityLevel, Preset)>) -> Self {
        Self {
            presets: presets.into_iter().collect(),
        }
    }

    /// Look up the preset for `level`.
    pub fn preset_for(&self, level: IntensityLevel) -> Result<&Preset> {
        self.presets.get(&level).ok_or_else(|| {
            OrchestratorError::InvalidIntensity(format!("No preset defined for intensity '{}'", level))
        })
    }

    /// Effects for `level` with `overrides` applied.
    pub fn effects_for(&self, level: IntensityLevel, overrides: &EffectOverrides) -> Result<EffectBundle> {
        overrides.validate()?;
        Ok(self.preset_for(level)?.effects.merged(overrides))
    }

    pub fn levels(&self) -> impl Iterator<Item = IntensityLevel> + '_ {
        self.presets.keys().copied()
    }
}
