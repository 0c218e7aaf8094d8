//! Greeting detection.
//!
//! A message is a greeting when it opens with a salutation, so
//! "hello, what is OPT?" still gets the greeting reply.

use std::sync::LazyLock;

use rand::seq::IndexedRandom;
use regex::Regex;

static GREETING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^\s*(?:hi|hello|hey|greetings)\b",
        r"(?i)^\s*good\s+(?:morning|afternoon|evening)\b",
        r"(?i)^\s*howdy\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid greeting regex"))
    .collect()
});

/// Replies picked at random for a detected greeting.
pub const GREETING_REPLIES: &[&str] = &[
    "Hello! I'm here to help with your F1 visa questions. What would you like to know?",
    "Hi there! Ask me anything about work authorization, academics, or travel on an F1 visa.",
    "Hey! How can I help you with your F1 student questions today?",
    "Greetings! I can answer questions about OPT, CPT, enrollment rules, and travel. What's on your mind?",
];

/// True when the text opens with a salutation.
pub fn is_greeting(text: &str) -> bool {
    GREETING_PATTERNS.iter().any(|re| re.is_match(text))
}

/// One of [`GREETING_REPLIES`], chosen uniformly.
pub fn greeting_reply() -> &'static str {
    GREETING_REPLIES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(GREETING_REPLIES[0])
}
