//! Token normalization for keyword search.
//!
//! Reduces a word to its stem with the Snowball Russian stemmer so that
//! "экзамены", "экзаменов" and "экзамен" all compare equal. Non-Cyrillic
//! input passes through lowercased.

use rust_stemmers::{Algorithm, Stemmer};

/// Language-aware token normalizer. Pure and deterministic; never panics
/// and never returns an empty string for non-empty printable input.
pub struct Normalizer {
    stemmer: Stemmer,
}

impl Normalizer {
    pub fn russian() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::Russian),
        }
    }

    /// Best-effort dictionary form of a single token: trimmed, lowercased,
    /// stemmed. Unknown tokens come back lowercased rather than empty.
    pub fn lemma(&self, token: &str) -> String {
        let lowered = token.trim().to_lowercase();
        if lowered.is_empty() {
            return lowered;
        }
        let stemmed = self.stemmer.stem(&lowered).into_owned();
        if stemmed.is_empty() { lowered } else { stemmed }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::russian()
    }
}
