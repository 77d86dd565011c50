//! Static phrase tables for the text scorer
//!
//! Tables are normalized once on first use and never mutated afterwards.
//! Matching is case-insensitive and anchored on word boundaries, so
//! "alert" does not fire inside "alerted" and "via" does not fire inside
//! "trivia".

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Phrase category tracked by the text scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PhraseCategory {
    Clickbait,
    Emotional,
    Urgency,
    Sensational,
    Conspiracy,
    Credibility,
    Citation,
}

const CLICKBAIT: &[&str] = &[
    "you won't believe",
    "shocking truth",
    "doctors hate",
    "one weird trick",
    "what happened next",
    "mind blowing",
    "this is why",
    "the real reason",
    "they don't want",
];

const EMOTIONAL: &[&str] = &[
    "outrageous",
    "devastating",
    "terrifying",
    "horrifying",
    "amazing",
    "incredible",
    "unbelievable",
    "miracle",
    "scandal",
    "exposed",
    "revealed",
    "disgusting",
    "infuriating",
    "heart-breaking",
    "tragic",
];

const URGENCY: &[&str] = &[
    "breaking",
    "urgent",
    "alert",
    "warning",
    "must read",
    "immediately",
    "right now",
    "before it's too late",
    "limited time",
    "act now",
    "don't miss",
];

const SENSATIONAL: &[&str] = &[
    "shocking",
    "explosive",
    "bombshell",
    "catastrophic",
    "jaw-dropping",
];

const CONSPIRACY: &[&str] = &[
    "cover-up",
    "conspiracy",
    "they don't want you to know",
    "hidden truth",
    "wake up",
    "mainstream media lies",
];

const CREDIBILITY: &[&str] = &[
    "study shows",
    "studies show",
    "research indicates",
    "expert",
    "professor",
    "dr.",
    "ph.d.",
    "university",
    "institute",
    "published",
    "journal",
    "peer-reviewed",
    "data shows",
    "statistics",
    "evidence",
    "analysis",
];

const CITATION: &[&str] = &[
    "source:",
    "via",
    "according to",
    "reported by",
    "published in",
    "study by",
    "cited in",
];

/// Normalized phrase tables by category
pub static PHRASES: Lazy<BTreeMap<PhraseCategory, Vec<String>>> = Lazy::new(|| {
    [
        (PhraseCategory::Clickbait, CLICKBAIT),
        (PhraseCategory::Emotional, EMOTIONAL),
        (PhraseCategory::Urgency, URGENCY),
        (PhraseCategory::Sensational, SENSATIONAL),
        (PhraseCategory::Conspiracy, CONSPIRACY),
        (PhraseCategory::Credibility, CREDIBILITY),
        (PhraseCategory::Citation, CITATION),
    ]
    .into_iter()
    .map(|(category, phrases)| {
        (
            category,
            phrases.iter().map(|p| normalize_text(p)).collect(),
        )
    })
    .collect()
});

/// Lowercase and fold typographic apostrophes to ASCII
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'")
}

/// Number of distinct phrases of `category` present in normalized `text`
pub fn count_hits(text: &str, category: PhraseCategory) -> usize {
    PHRASES
        .get(&category)
        .map(|phrases| {
            phrases
                .iter()
                .filter(|phrase| contains_phrase(text, phrase))
                .count()
        })
        .unwrap_or(0)
}

/// Whether `phrase` occurs in `text` with word boundaries on both sides
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    text.match_indices(phrase).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let after_ok = text[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));
        before_ok && after_ok
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
