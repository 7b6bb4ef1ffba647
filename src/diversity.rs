//! Diversity Selector: near-duplicate removal and max-min diversification.
//!
//! ```text
//! candidates ─→ collapse exact duplicates
//!            ─→ drop degraded / too short / placeholder-marked
//!            ─→ sequential Jaccard dedup (keep if sim < threshold to all kept)
//!            ─→ greedy max-min down to `target`
//! ```
//!
//! The selector is stateless and deterministic for a given input order.
//! A non-empty input always yields a non-empty output: when nothing survives
//! the validity filter, the first few raw candidates are returned instead.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::outcome::GenerationOutcome;
use crate::utilities::string_utils::{jaccard, tokenize};

/// Tuning for [`DiversitySelector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Minimum trimmed length, in characters, of a valid candidate.
    pub min_length: usize,
    /// Candidates at or above this similarity to a kept one are dropped.
    pub similarity_threshold: f64,
    pub min_candidates: usize,
    pub max_candidates: usize,
    /// Raw candidates returned when none pass the validity filter.
    pub fallback_count: usize,
    /// Prefixes marking error or placeholder text.
    pub placeholder_markers: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_length: 20,
            similarity_threshold: 0.85,
            min_candidates: 4,
            max_candidates: 6,
            fallback_count: 4,
            placeholder_markers: vec!["[ERROR".into(), "[DEGRADED".into(), "// SAMPLE(".into()],
        }
    }
}

/// Curates a candidate set down to a mutually dissimilar subset.
#[derive(Debug, Clone, Default)]
pub struct DiversitySelector {
    config: SelectorConfig,
}

struct Scored<'a> {
    outcome: &'a GenerationOutcome,
    tokens: HashSet<String>,
}

impl DiversitySelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Selection size for a requested variant count:
    /// `clamp(variant_count / 2, min_candidates, max_candidates)`.
    pub fn target_for(&self, variant_count: usize) -> usize {
        (variant_count / 2)
            .max(self.config.min_candidates)
            .min(self.config.max_candidates)
    }

    /// Whether `outcome` may take part in selection at all.
    pub fn is_valid(&self, outcome: &GenerationOutcome) -> bool {
        let Some(text) = outcome.text() else {
            return false;
        };
        let trimmed = text.trim();
        trimmed.chars().count() >= self.config.min_length
            && !self
                .config
                .placeholder_markers
                .iter()
                .any(|marker| trimmed.starts_with(marker.as_str()))
    }

    /// Curate `candidates` down to at most `target` (and `max_candidates`) items.
    pub fn select(&self, candidates: &[GenerationOutcome], target: usize) -> Vec<GenerationOutcome> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let target = target.clamp(1, self.config.max_candidates.max(1));

        let mut seen: HashSet<&GenerationOutcome> = HashSet::new();
        let valid: Vec<Scored<'_>> = candidates
            .iter()
            .filter(|c| seen.insert(*c))
            .filter(|c| self.is_valid(c))
            .map(|c| Scored {
                outcome: c,
                tokens: tokenize(c.text().unwrap_or_default()),
            })
            .collect();

        if valid.is_empty() {
            let n = self
                .config
                .fallback_count
                .min(self.config.max_candidates)
                .min(candidates.len())
                .max(1);
            log::debug!("No valid candidates out of {}; falling back to first {}", candidates.len(), n);
            return candidates[..n].to_vec();
        }

        let kept = self.sequential_dedup(valid);
        let selected = if kept.len() > target {
            max_min_select(&kept, target)
        } else {
            kept
        };

        log::debug!(
            "Diversity selection: {} candidates -> {} (target {})",
            candidates.len(),
            selected.len(),
            target
        );
        selected.into_iter().map(|s| s.outcome.clone()).collect()
    }

    /// Keep each item only if it is below the similarity threshold to every
    /// earlier kept item.
    fn sequential_dedup<'a>(&self, items: Vec<Scored<'a>>) -> Vec<Scored<'a>> {
        let mut kept: Vec<Scored<'a>> = Vec::with_capacity(items.len());
        for item in items {
            if kept
                .iter()
                .all(|k| jaccard(&item.tokens, &k.tokens) < self.config.similarity_threshold)
            {
                kept.push(item);
            }
        }
        kept
    }

    /// Drop near-duplicate generated texts while preserving order.
    ///
    /// Degraded entries are kept untouched so failures stay visible.
    pub fn dedup_outcomes(&self, outcomes: &[GenerationOutcome]) -> Vec<GenerationOutcome> {
        let mut kept_tokens: Vec<HashSet<String>> = Vec::new();
        let mut out = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.text() {
                Some(text) => {
                    let tokens = tokenize(text);
                    if kept_tokens
                        .iter()
                        .all(|k| jaccard(&tokens, k) < self.config.similarity_threshold)
                    {
                        kept_tokens.push(tokens);
                        out.push(outcome.clone());
                    }
                }
                None => out.push(outcome.clone()),
            }
        }
        out
    }
}

/// Greedy max-min: start from the first item, then repeatedly take the item
/// whose minimum distance (`1 − sim`) to the selection is largest. Ties go
/// to the earliest item.
fn max_min_select<'a>(items: &[Scored<'a>], target: usize) -> Vec<Scored<'a>> {
    let mut selected: Vec<usize> = vec![0];
    let mut remaining: Vec<usize> = (1..items.len()).collect();

    while selected.len() < target && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_dist = f64::NEG_INFINITY;
        for (pos, &idx) in remaining.iter().enumerate() {
            let min_dist = selected
                .iter()
                .map(|&s| 1.0 - jaccard(&items[idx].tokens, &items[s].tokens))
                .fold(f64::INFINITY, f64::min);
            if min_dist > best_dist {
                best_dist = min_dist;
                best_pos = pos;
            }
        }
        selected.push(remaining.remove(best_pos));
    }

    selected
        .into_iter()
        .map(|i| Scored {
            outcome: items[i].outcome,
            tokens: items[i].tokens.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
