//! Place-name extraction from free text.

use regex::Regex;
use std::sync::LazyLock;

/// Capitalized phrase introduced by a locative preposition, e.g.
/// "in Riverdale", "near Los Angeles, California".
static PLACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:in|at|near|around|across|from|outside|throughout)\s+([A-Z][\w'-]*(?:(?:\s+|,\s*)[A-Z][\w'-]*)*)",
    )
    .expect("place pattern is valid")
});

/// Any run of capitalized words. Used for names with no preposition in
/// front, e.g. "Earthquake hits Tokyo".
static CAPITALIZED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][\w'-]*(?:\s+[A-Z][\w'-]*)*").expect("capitalized pattern is valid")
});

/// Last-resort pattern: everything word-like after a standalone "in".
static FALLBACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bin\s+([\w\s]+)").expect("fallback pattern is valid"));

/// Finds candidate place names in text, best candidate first.
pub trait PlaceExtractor: Send + Sync {
    fn extract_places(&self, text: &str) -> Vec<String>;
}

/// Rule-based extractor.
///
/// Capitalized phrases after a locative preposition come first. After them
/// come other capitalized phrases, skipping the first word of a sentence
/// and all-caps words such as "SOS".
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPlaceExtractor;

impl PlaceExtractor for HeuristicPlaceExtractor {
    fn extract_places(&self, text: &str) -> Vec<String> {
        let mut spans = Vec::new();
        let mut places = Vec::new();
        for m in PLACE_RE.captures_iter(text).filter_map(|caps| caps.get(1)) {
            spans.push(m.range());
            places.push(m.as_str().to_string());
        }

        for m in CAPITALIZED_RE.find_iter(text) {
            let overlaps = spans
                .iter()
                .any(|span| m.start() < span.end && span.start < m.end());
            if overlaps || starts_sentence(text, m.start()) || is_all_caps(m.as_str()) {
                continue;
            }
            places.push(m.as_str().to_string());
        }
        places
    }
}

fn starts_sentence(text: &str, at: usize) -> bool {
    match text[..at].trim_end().chars().last() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?'),
    }
}

fn is_all_caps(phrase: &str) -> bool {
    !phrase.chars().any(char::is_lowercase)
}

/// Applies the "in <words>" fallback and returns the trimmed phrase.
pub fn fallback_candidate(text: &str) -> Option<String> {
    FALLBACK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|candidate| !candidate.is_empty())
}
