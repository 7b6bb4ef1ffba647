//! Instruction Generator: effect bundle → system instruction text.
//!
//! Three tiers escalate in structure and explicitness:
//!
//! | Tier | Shape |
//! |------|-------|
//! | `Subtle` | one descriptive paragraph |
//! | `Balanced` | percentage parameter block + operational guidelines |
//! | `Extreme` | mode block with multipliers, categorical toggles, numbered directives |
//!
//! Output is a pure function of its inputs. The categorical toggles use fixed
//! cut points (see [`InstructionToggles::from_effects`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::persona::presets::{EffectBundle, IntensityLevel};

// ============================================================================
// Threshold constants
// ============================================================================

/// `hallucination_factor` above this relaxes the coherence filter.
pub const COHERENCE_RELAX_THRESHOLD: f64 = 0.5;
/// `memory_blend` above this enables cross-domain recall.
pub const CROSS_DOMAIN_RECALL_THRESHOLD: f64 = 1.3;
/// `cognition_flexibility` above this makes framing fluid.
pub const FLUID_FRAMING_THRESHOLD: f64 = 1.5;
/// Drift tolerance above this loosens semantic anchoring.
pub const LOOSE_ANCHORING_THRESHOLD: f64 = 0.5;
/// `decentering_score` at or above this decenters perspective.
pub const DECENTERED_PERSPECTIVE_THRESHOLD: f64 = 1.0;

// ============================================================================
// Tier
// ============================================================================

/// Verbosity tier of the generated instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionTier {
    Subtle,
    Balanced,
    Extreme,
}

impl InstructionTier {
    /// Tier used when the trip configuration does not pin one.
    pub fn for_level(level: IntensityLevel) -> Self {
        match level {
            IntensityLevel::Light | IntensityLevel::Moderate | IntensityLevel::Deep => Self::Subtle,
            IntensityLevel::Beyond => Self::Balanced,
            IntensityLevel::Surreal => Self::Extreme,
        }
    }
}

impl fmt::Display for InstructionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subtle => "subtle",
            Self::Balanced => "balanced",
            Self::Extreme => "extreme",
        };
        f.write_str(name)
    }
}

impl FromStr for InstructionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subtle" => Ok(Self::Subtle),
            "balanced" => Ok(Self::Balanced),
            "extreme" => Ok(Self::Extreme),
            other => Err(format!("Unknown instruction tier: {}", other)),
        }
    }
}

// ============================================================================
// Toggles
// ============================================================================

/// Categorical switches derived from effect magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionToggles {
    pub coherence_relaxed: bool,
    pub voice_distributed: bool,
    pub cross_domain_recall: bool,
    pub fluid_framing: bool,
    pub loose_anchoring: bool,
    pub decentered: bool,
}

impl InstructionToggles {
    pub fn from_effects(effects: &EffectBundle, drift_tolerance: f64) -> Self {
        Self {
            coherence_relaxed: effects.hallucination_factor > COHERENCE_RELAX_THRESHOLD,
            voice_distributed: effects.ego_dissolution,
            cross_domain_recall: effects.memory_blend > CROSS_DOMAIN_RECALL_THRESHOLD,
            fluid_framing: effects.cognition_flexibility > FLUID_FRAMING_THRESHOLD,
            loose_anchoring: drift_tolerance > LOOSE_ANCHORING_THRESHOLD,
            decentered: effects.decentering_score >= DECENTERED_PERSPECTIVE_THRESHOLD,
        }
    }

    /// `(label, value)` pairs as rendered in the extreme tier.
    pub fn labels(&self) -> [(&'static str, &'static str); 6] {
        let pick = |on: bool, yes: &'static str, no: &'static str| if on { yes } else { no };
        [
            ("Coherence filter", pick(self.coherence_relaxed, "RELAXED", "ACTIVE")),
            ("Narrative voice", pick(self.voice_distributed, "DISTRIBUTED", "CENTERED")),
            ("Associative recall", pick(self.cross_domain_recall, "CROSS-DOMAIN", "LOCAL")),
            ("Conceptual framing", pick(self.fluid_framing, "FLUID", "STRUCTURED")),
            ("Semantic anchoring", pick(self.loose_anchoring, "LOOSE", "TIGHT")),
            ("Perspective", pick(self.decentered, "DECENTERED", "ANCHORED")),
        ]
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Build the system instruction for `effects` at `tier`.
pub fn generate_instruction(effects: &EffectBundle, drift_tolerance: f64, tier: InstructionTier) -> String {
    let toggles = InstructionToggles::from_effects(effects, drift_tolerance);
    match tier {
        InstructionTier::Subtle => subtle(&toggles),
        InstructionTier::Balanced => balanced(effects, drift_tolerance, &toggles),
        InstructionTier::Extreme => extreme(effects, drift_tolerance, &toggles),
    }
}

fn percent(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

fn subtle(toggles: &InstructionToggles) -> String {
    let mut sentences = vec![
        "Approach this conversation with an open, associative mind.".to_string(),
        "Favor fresh connections and non-literal readings over the most obvious answer, and let \
         metaphor and analogy carry part of the meaning."
            .to_string(),
    ];
    if toggles.cross_domain_recall {
        sentences.push("Borrow freely from distant fields when a link feels alive.".to_string());
    }
    if toggles.voice_distributed {
        sentences.push("Speak less from a single fixed point of view and more from the idea itself.".to_string());
    }
    sentences.push(if toggles.loose_anchoring {
        "Wander where the thread leads, returning to the request once the idea has taken shape.".to_string()
    } else {
        "Stay close to the request while you wander, so every idea remains usable.".to_string()
    });
    sentences.join(" ")
}

fn balanced(effects: &EffectBundle, drift_tolerance: f64, toggles: &InstructionToggles) -> String {
    let mut sections = Vec::new();

    sections.push(
        [
            "[Creative Parameters]".to_string(),
            format!("Creativity amplification: {}%", percent(effects.creativity_boost)),
            format!("Cognitive flexibility: {}%", percent(effects.cognition_flexibility)),
            format!("Memory blending: {}%", percent(effects.memory_blend)),
            format!("Hallucination allowance: {}%", percent(effects.hallucination_factor)),
            format!("Drift tolerance: {}%", percent(drift_tolerance)),
        ]
        .join("\n"),
    );

    let mut guidelines = vec![
        "- Generate ideas beyond the first obvious answer.".to_string(),
        "- Connect concepts through analogy and metaphor.".to_string(),
    ];
    guidelines.push(if toggles.fluid_framing {
        "- Reframe the problem from at least one unexpected angle.".to_string()
    } else {
        "- Keep a clear structure while varying the content.".to_string()
    });
    guidelines.push(if toggles.cross_domain_recall {
        "- Blend references from unrelated domains.".to_string()
    } else {
        "- Draw references from the domain at hand.".to_string()
    });
    guidelines.push(if toggles.coherence_relaxed {
        "- Tolerate speculative leaps; coherence may bend.".to_string()
    } else {
        "- Keep every claim coherent and grounded.".to_string()
    });
    guidelines.push(if toggles.loose_anchoring {
        "- Let meaning drift, then tie it back to the request.".to_string()
    } else {
        "- Keep meaning anchored to the request.".to_string()
    });

    sections.push(format!("Operational guidelines:\n{}", guidelines.join("\n")));
    sections.join("\n\n")
}

fn extreme(effects: &EffectBundle, drift_tolerance: f64, toggles: &InstructionToggles) -> String {
    let mut sections = Vec::new();

    sections.push(
        [
            "[EXPANDED COGNITION MODE]".to_string(),
            format!("Creativity: ×{:.2}", effects.creativity_boost),
            format!("Cognitive flexibility: ×{:.2}", effects.cognition_flexibility),
            format!("Memory blending: ×{:.2}", effects.memory_blend),
            format!("Drift intensity: ×{:.2}", effects.drift_intensity),
            format!("Hallucination factor: {:.2}", effects.hallucination_factor),
            format!("Drift tolerance: {:.2}", drift_tolerance),
            format!("Decentering: {:.2}", effects.decentering_score),
        ]
        .join("\n"),
    );

    sections.push(
        toggles
            .labels()
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("\n"),
    );

    let mut directives: Vec<&str> = vec![
        "Open with the least expected interpretation of the request.",
        "Fuse at least two unrelated concepts into a single image.",
        "Describe ideas through sensory detail as well as function.",
    ];
    if toggles.voice_distributed {
        directives.push("Let the idea speak for itself rather than through a narrator.");
    }
    if toggles.cross_domain_recall {
        directives.push("Pull one reference from a field far outside the topic.");
    }
    if toggles.coherence_relaxed {
        directives.push("Allow dream logic where it opens a new path.");
    }
    directives.push("End each idea with a concrete, usable takeaway.");

    let numbered = directives
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{}. {}", i + 1, d))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("Content directives:\n{}", numbered));

    sections.join("\n\n")
}
