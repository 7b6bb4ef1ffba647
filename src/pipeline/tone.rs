//! Tone styling for converge prompts.
//!
//! Styling is positional like the phrase rotation: the same text and index
//! always produce the same output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static DREAMY_NOUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(idea|vision|path|signal|network|future|now|world)\b").unwrap());
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+(\w)").unwrap());

const DREAMY_ADJECTIVES: [&str; 6] = ["luminous", "velvet", "sonic", "crystalline", "amber", "silken"];

const DREAMY_ASIDES: [&str; 3] = [
    "…and what if we step sideways for a moment? ",
    "(a small detour: curiosity often finds doors) ",
    "Briefly, let's peer behind the obvious. ",
];

const DREAMY_WHAT_IFS: [&str; 3] = [
    "What if the map is still being drawn? ",
    "Suppose the signal is also a compass. ",
    "Imagine the present as a doorway. ",
];

/// Voice applied to refinement directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    ExplorerDreamy,
}

impl Tone {
    /// Style `text` for prompt `index`.
    pub fn apply(&self, text: &str, index: usize) -> String {
        match self {
            Tone::ExplorerDreamy => explorer_dreamy(text, index),
        }
    }
}

/// Adjectives on evocative nouns, an aside on every third prompt starting at
/// 1, a what-if opener on every third starting at 2, one sentence per line.
fn explorer_dreamy(text: &str, index: usize) -> String {
    let mut k = 0;
    let mut styled = DREAMY_NOUNS
        .replace_all(text, |caps: &Captures| {
            let adjective = DREAMY_ADJECTIVES[(index + k) % DREAMY_ADJECTIVES.len()];
            k += 1;
            format!("{} {}", adjective, &caps[0])
        })
        .into_owned();

    let round = index / 3;
    match index % 3 {
        1 => {
            let aside = DREAMY_ASIDES[round % DREAMY_ASIDES.len()];
            let at = styled.find(". ").map(|pos| pos + 2).unwrap_or(0);
            styled.insert_str(at, aside);
        }
        2 => {
            let opener = DREAMY_WHAT_IFS[round % DREAMY_WHAT_IFS.len()];
            styled.insert_str(0, opener);
        }
        _ => {}
    }

    SENTENCE_BREAK
        .replace_all(&styled, |caps: &Captures| format!(".\n{}", caps[1].to_uppercase()))
        .into_owned()
}
