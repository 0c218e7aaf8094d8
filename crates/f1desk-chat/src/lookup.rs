//! Curated-answer lookup and reference passage selection.
//!
//! The primary scan is a case-insensitive symmetric substring test: an
//! entry matches when either its question contains the input or the input
//! contains its question. It is cheap and predictable, though short inputs
//! like "a" match almost anything. The keyword scan only runs when the
//! substring scan finds nothing.

use std::collections::HashSet;

use f1desk_core::types::{NewQaEntry, QaEntry};

/// Words ignored when comparing questions by keyword.
const STOP_WORDS: &[&str] = &[
    "a", "about", "am", "an", "any", "are", "be", "can", "could", "do", "does", "explain",
    "for", "how", "i", "if", "in", "is", "it", "me", "my", "of", "on", "please", "should",
    "tell", "the", "there", "to", "what", "when", "where", "which", "who", "why", "will",
    "with", "would", "you", "your",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Lowercased alphanumeric runs of `text`.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Tokens of `text` that are not stop words.
pub fn significant_tokens(text: &str) -> Vec<String> {
    tokens(text).filter(|w| !is_stop_word(w)).collect()
}

/// First entry, in store order, whose question and the input contain one
/// another (case-insensitive). Blank input never matches.
pub fn substring_match<'a>(text: &str, entries: &'a [QaEntry]) -> Option<&'a QaEntry> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    entries.iter().find(|entry| {
        let question = entry.question.to_lowercase();
        !question.is_empty() && (question.contains(&needle) || needle.contains(&question))
    })
}

/// First entry, in store order, whose significant question words all occur
/// as whole words in the input. Entries made only of stop words never match.
pub fn keyword_match<'a>(text: &str, entries: &'a [QaEntry]) -> Option<&'a QaEntry> {
    let words: HashSet<String> = tokens(text).collect();
    if words.is_empty() {
        return None;
    }
    entries.iter().find(|entry| {
        let required = significant_tokens(&entry.question);
        !required.is_empty() && required.iter().all(|w| words.contains(w))
    })
}

/// Substring scan, then the keyword scan when enabled.
pub fn find_curated<'a>(
    text: &str,
    entries: &'a [QaEntry],
    keyword_fallback: bool,
) -> Option<&'a QaEntry> {
    substring_match(text, entries).or_else(|| {
        if keyword_fallback {
            keyword_match(text, entries)
        } else {
            None
        }
    })
}

// =============================================================================
// Reference passages
// =============================================================================

/// Background passages handed to the generative responder as context.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    passages: Vec<NewQaEntry>,
}

impl ReferenceLibrary {
    pub fn new(passages: Vec<NewQaEntry>) -> Self {
        Self { passages }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Passages sharing at least one significant word with the input,
    /// formatted as question/answer pairs. `None` when nothing is relevant.
    pub fn context_for(&self, text: &str) -> Option<String> {
        let wanted: HashSet<String> = significant_tokens(text).into_iter().collect();
        if wanted.is_empty() {
            return None;
        }
        let relevant: Vec<String> = self
            .passages
            .iter()
            .filter(|p| {
                significant_tokens(&p.question)
                    .iter()
                    .any(|w| wanted.contains(w))
            })
            .map(|p| format!("Q: {}\nA: {}", p.question, p.answer))
            .collect();
        if relevant.is_empty() {
            None
        } else {
            Some(relevant.join("\n\n"))
        }
    }
}
