//! Topical relevance filter.
//!
//! The search API matches fuzzily, so results mentioning only part of the
//! program name slip through. A candidate is kept only when its normalized
//! text contains a configured phrase (internal whitespace ignored) or a
//! configured token standing as its own word.

use nasol_core::RelevanceRules;

use crate::clean::normalize_text;

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    /// Phrases lower-cased with all whitespace removed.
    phrases: Vec<String>,
    tokens: Vec<String>,
}

impl RelevanceFilter {
    #[must_use]
    pub fn new(rules: &RelevanceRules) -> Self {
        Self {
            phrases: rules.phrases.iter().map(|p| squash(p)).collect(),
            tokens: rules.tokens.iter().map(|t| t.trim().to_lowercase()).collect(),
        }
    }

    /// Returns `true` if `text` qualifies as on-topic.
    #[must_use]
    pub fn is_relevant(&self, text: &str) -> bool {
        let normalized = normalize_text(text);

        let squashed = squash(&normalized);
        if self.phrases.iter().any(|p| squashed.contains(p.as_str())) {
            return true;
        }

        normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| self.tokens.iter().any(|t| t == word))
    }
}

fn squash(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
