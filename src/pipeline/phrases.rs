//! Prompt text used by the explore and converge phases.
//!
//! Phrase choice is positional (`index mod len`), never random, so a run is
//! reproducible from its inputs.

/// Divergence lenses rotated across explore prompts.
pub const DIVERGENCE_PHRASES: [&str; 6] = [
    "Approach this through a mythic lens: origins, journeys, constellations.",
    "Approach this through the senses: sound, texture, scent, temperature.",
    "Approach this as a physicist would: superposition, orbits, unseen forces.",
    "Approach this playfully: games, riddles, toys, surprising reversals.",
    "Approach this as an architect would: scaffolds, keystones, light and space.",
    "Approach this cinematically: a single shot, a cut, a montage, a spotlight.",
];

/// Refinement focus rotated across converge prompts.
pub const REFINEMENT_DIRECTIVES: [&str; 6] = [
    "its implications",
    "its practical applications",
    "its edge cases",
    "alternative perspectives on it",
    "the principles underneath it",
    "its broader context",
];

/// Anchor adherence used while converging.
pub const CONVERGE_ANCHOR_STRENGTH: f64 = 0.70;

/// Explore suffix for prompt `index`.
pub fn divergence_phrase(index: usize, intensity: f64, drift: f64) -> String {
    let lens = DIVERGENCE_PHRASES[index % DIVERGENCE_PHRASES.len()];
    format!(
        "{} Diverge from the obvious answer (divergence intensity={:.2}, semantic drift={:.2}).",
        lens, intensity, drift
    )
}

/// Converge instruction for candidate `index`.
pub fn refinement_directive(index: usize, intensity: f64) -> String {
    let focus = REFINEMENT_DIRECTIVES[index % REFINEMENT_DIRECTIVES.len()];
    format!(
        "Refine the idea above into a sharper, more complete version. Focus on {} (refinement intensity={:.2}).",
        focus, intensity
    )
}

/// Wrap `text` with anchor lines and an adherence footer.
///
/// Without anchors the text is returned unchanged.
pub fn with_anchors(text: &str, anchors: &[String], strength: f64) -> String {
    if anchors.is_empty() {
        return text.to_string();
    }
    let prefix = anchors
        .iter()
        .map(|a| format!("• Anchor: {}", a))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{}\n\n{}\n\n(Ensure concepts ladder back to anchors with strength={:.2})",
        prefix, text, strength
    )
}

/// Re-anchor a curated candidate before it is refined.
///
/// Drops blank lines and any `(Ensure ...)` footer left over from an earlier
/// [`with_anchors`] pass, then appends an adherence footer with `adherence`
/// as a whole percentage. Without anchors the text is returned unchanged.
pub fn clamp_to_anchors(text: &str, anchors: &[String], adherence: f64) -> String {
    if anchors.is_empty() {
        return text.to_string();
    }
    let body = text
        .split('\n')
        .filter(|line| !line.is_empty() && !line.trim_start().starts_with("(Ensure"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n\n(Adhere to anchors ≥ {:.0}%)", body, adherence * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_rotation() {
        assert_eq!(
            divergence_phrase(0, 0.9, 0.5),
            divergence_phrase(DIVERGENCE_PHRASES.len(), 0.9, 0.5)
        );
        assert_ne!(divergence_phrase(0, 0.9, 0.5), divergence_phrase(1, 0.9, 0.5));
        assert!(divergence_phrase(2, 0.45, 0.15).contains("divergence intensity=0.45, semantic drift=0.15"));
    }

    #[test]
    fn test_refinement_rotation() {
        assert!(refinement_directive(0, 0.25).contains("implications"));
        assert!(refinement_directive(5, 0.25).contains("broader context"));
        assert!(refinement_directive(6, 0.25).contains("implications"));
    }

    #[test]
    fn test_with_anchors() {
        assert_eq!(with_anchors("idea", &[], 0.5), "idea");
        let anchored = with_anchors("idea", &["warmth".into(), "ritual".into()], 0.5);
        assert_eq!(
            anchored,
            "• Anchor: warmth\n• Anchor: ritual\n\nidea\n\n(Ensure concepts ladder back to anchors with strength=0.50)"
        );
    }

    #[test]
    fn test_clamp_to_anchors() {
        let anchors = vec!["fox".to_string()];
        assert_eq!(clamp_to_anchors("a fox\n\nat dusk", &[], 0.5), "a fox\n\nat dusk");

        let echoed = "A fox at dusk.\n\n  (Ensure concepts ladder back to anchors with strength=0.70)\nMoonlit tail.";
        assert_eq!(
            clamp_to_anchors(echoed, &anchors, 0.5),
            "A fox at dusk.\nMoonlit tail.\n\n(Adhere to anchors ≥ 50%)"
        );
        assert!(clamp_to_anchors("x", &anchors, 0.85).ends_with("(Adhere to anchors ≥ 85%)"));
    }
}
