//! LLM Parameter Modulation: EffectBundle → sampling parameters.
//!
//! Fine-tunes a preset's sampling bundle from the (possibly overridden)
//! effects that are actually in force for a trip:
//! ```text
//! creativity_boost ─┬─ temperature += (boost − 1) × 0.25   (≤ 2.0)
//!                   └─ top_p       += (boost − 1) × 0.1    (≤ 1.0)
//! ego_dissolution  ─── presence_penalty = min(presence, −0.25)
//! ```

use crate::llms::sampling::{SamplingConfig, MAX_TEMPERATURE};
use crate::persona::presets::EffectBundle;

/// Temperature gained per unit of creativity boost above 1.
const TEMPERATURE_PER_BOOST: f64 = 0.25;
/// Top-p gained per unit of creativity boost above 1.
const TOP_P_PER_BOOST: f64 = 0.1;
/// Presence penalty ceiling while ego dissolution is on.
const EGO_DISSOLUTION_PRESENCE: f64 = -0.25;

/// Compute the sampling defaults a trip pushes into the agent.
///
/// The result always stays inside the backend range: temperature in
/// `[0, 2]`, top_p in `(0, 1]`.
pub fn modulate_sampling(base: &SamplingConfig, effects: &EffectBundle) -> SamplingConfig {
    let boost = effects.creativity_boost - 1.0;

    let temperature = (base.temperature + boost * TEMPERATURE_PER_BOOST).clamp(0.0, MAX_TEMPERATURE);
    let top_p = (base.top_p + boost * TOP_P_PER_BOOST).clamp(0.01, 1.0);

    let presence_penalty = if effects.ego_dissolution {
        base.presence_penalty.min(EGO_DISSOLUTION_PRESENCE)
    } else {
        base.presence_penalty
    };

    SamplingConfig {
        temperature,
        top_p,
        max_tokens: base.max_tokens,
        presence_penalty,
        frequency_penalty: base.frequency_penalty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::presets::{EffectOverrides, IntensityLevel, PresetTable};

    #[test]
    fn test_deep_preset_modulation() {
        let table = PresetTable::standard();
        let deep = table.preset_for(IntensityLevel::Deep).unwrap();
        let s = modulate_sampling(&deep.sampling, &deep.effects);
        // 1.15 + 0.8 × 0.25
        assert!((s.temperature - 1.35).abs() < 1e-9);
        // 0.98 + 0.08 capped at 1.0
        assert_eq!(s.top_p, 1.0);
        assert_eq!(s.presence_penalty, -0.25);
        assert_eq!(s.frequency_penalty, -0.05);
    }

    #[test]
    fn test_light_preset_keeps_presence() {
        let table = PresetTable::standard();
        let light = table.preset_for(IntensityLevel::Light).unwrap();
        let s = modulate_sampling(&light.sampling, &light.effects);
        assert!((s.temperature - 0.85).abs() < 1e-9);
        assert!((s.top_p - 0.92).abs() < 1e-9);
        assert_eq!(s.presence_penalty, 0.0);
    }

    #[test]
    fn test_stronger_penalty_survives_ego_dissolution() {
        let table = PresetTable::standard();
        let surreal = table.preset_for(IntensityLevel::Surreal).unwrap();
        let s = modulate_sampling(&surreal.sampling, &surreal.effects);
        assert_eq!(s.presence_penalty, -0.45);
    }

    #[test]
    fn test_every_level_stays_in_backend_range() {
        let table = PresetTable::standard();
        let extreme = EffectOverrides {
            creativity_boost: Some(10.0),
            ..Default::default()
        };
        let flat = EffectOverrides {
            creativity_boost: Some(0.0),
            ..Default::default()
        };
        for level in IntensityLevel::ALL {
            let preset = table.preset_for(level).unwrap();
            for overrides in [EffectOverrides::default(), extreme, flat] {
                let effects = preset.effects.merged(&overrides);
                let s = modulate_sampling(&preset.sampling, &effects);
                assert!(s.is_within_backend_range(), "{} out of range: {:?}", level, s);
            }
        }
    }
}
