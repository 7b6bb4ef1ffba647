//! Sampling parameters sent with every generation call.

use serde::{Deserialize, Serialize};

/// Default completion budget used by the baseline and every preset.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Upper bound on temperature accepted by OpenAI-compatible backends.
pub const MAX_TEMPERATURE: f64 = 2.0;

/// The numeric controls governing a call's randomness and length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
}

impl SamplingConfig {
    /// Hard-coded baseline the agent starts from and returns to on reset.
    pub const fn baseline() -> Self {
        Self {
            temperature: 1.0,
            top_p: 1.0,
            max_tokens: DEFAULT_MAX_TOKENS,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }

    /// Field-wise merge: present override fields win, absent ones keep `self`.
    pub fn merged(&self, overrides: &SamplingOverrides) -> Self {
        Self {
            temperature: overrides.temperature.unwrap_or(self.temperature),
            top_p: overrides.top_p.unwrap_or(self.top_p),
            max_tokens: overrides.max_tokens.unwrap_or(self.max_tokens),
            presence_penalty: overrides.presence_penalty.unwrap_or(self.presence_penalty),
            frequency_penalty: overrides
                .frequency_penalty
                .unwrap_or(self.frequency_penalty),
        }
    }

    /// Whether the values are inside the range every supported backend accepts.
    pub fn is_within_backend_range(&self) -> bool {
        (0.0..=MAX_TEMPERATURE).contains(&self.temperature)
            && self.top_p > 0.0
            && self.top_p <= 1.0
            && (-2.0..=2.0).contains(&self.presence_penalty)
            && (-2.0..=2.0).contains(&self.frequency_penalty)
            && self.max_tokens > 0
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Partial sampling update; `None` leaves the stored default untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
}

impl From<SamplingConfig> for SamplingOverrides {
    fn from(config: SamplingConfig) -> Self {
        Self {
            temperature: Some(config.temperature),
            top_p: Some(config.top_p),
            max_tokens: Some(config.max_tokens),
            presence_penalty: Some(config.presence_penalty),
            frequency_penalty: Some(config.frequency_penalty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_values() {
        let b = SamplingConfig::baseline();
        assert_eq!(b.temperature, 1.0);
        assert_eq!(b.top_p, 1.0);
        assert_eq!(b.presence_penalty, 0.0);
        assert_eq!(b.frequency_penalty, 0.0);
        assert_eq!(b.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(b.is_within_backend_range());
    }

    #[test]
    fn test_merge_is_fieldwise() {
        let base = SamplingConfig::baseline();
        let merged = base.merged(&SamplingOverrides {
            temperature: Some(0.7),
            frequency_penalty: Some(-0.1),
            ..Default::default()
        });
        assert_eq!(merged.temperature, 0.7);
        assert_eq!(merged.frequency_penalty, -0.1);
        assert_eq!(merged.top_p, base.top_p);
        assert_eq!(merged.max_tokens, base.max_tokens);
        assert_eq!(merged.presence_penalty, base.presence_penalty);
    }

    #[test]
    fn test_empty_overrides_are_identity() {
        let base = SamplingConfig {
            temperature: 0.3,
            top_p: 0.5,
            max_tokens: 12,
            presence_penalty: 0.1,
            frequency_penalty: 0.2,
        };
        assert_eq!(base.merged(&SamplingOverrides::default()), base);
    }

    #[test]
    fn test_out_of_range_temperature() {
        let mut cfg = SamplingConfig::baseline();
        cfg.temperature = 2.5;
        assert!(!cfg.is_within_backend_range());
    }
}
