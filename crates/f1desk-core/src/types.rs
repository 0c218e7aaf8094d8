//! Shared domain types for the f1desk service.
//!
//! Curated Q&A entries, notifications, analytics records and transcript
//! turns. All types serialize to camelCase JSON for the chat widget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Q&A
// =============================================================================

/// A curated question with its answer and display category.
///
/// Immutable once stored; `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaEntry {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub category: String,
}

/// Insert payload for a Q&A entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQaEntry {
    pub question: String,
    pub answer: String,
    pub category: String,
}

impl NewQaEntry {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            category: category.into(),
        }
    }
}

/// A category the widget knows how to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnownCategory {
    pub id: &'static str,
    pub label: &'static str,
}

/// Categories used for grouping and display.
///
/// Stores accept entries outside this set; they are simply left unlabeled.
pub const KNOWN_CATEGORIES: &[KnownCategory] = &[
    KnownCategory {
        id: "academic",
        label: "Academic Requirements",
    },
    KnownCategory {
        id: "work",
        label: "Work Authorization",
    },
    KnownCategory {
        id: "travel",
        label: "Travel & Visa",
    },
];

/// Look up the display label for a category id.
pub fn category_label(category: &str) -> Option<&'static str> {
    KNOWN_CATEGORIES
        .iter()
        .find(|c| c.id == category)
        .map(|c| c.label)
}

/// A booking link for a human advisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdvisorLink {
    pub kind: &'static str,
    pub url: &'static str,
}

pub const ADVISOR_LINKS: &[AdvisorLink] = &[
    AdvisorLink {
        kind: "academic",
        url: "https://calendly.com/academic-advisor",
    },
    AdvisorLink {
        kind: "immigration",
        url: "https://calendly.com/iso-advisor",
    },
    AdvisorLink {
        kind: "career",
        url: "https://calendly.com/career-advisor",
    },
];

// =============================================================================
// Notifications
// =============================================================================

/// Notification urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse a stored priority string. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An informational notice shown next to the chat window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub date: DateTime<Utc>,
}

/// Insert payload for a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub date: DateTime<Utc>,
}

// =============================================================================
// Analytics
// =============================================================================

/// How often a question has been asked.
///
/// One record per distinct question, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalyticsRecord {
    pub id: u64,
    pub question: String,
    pub category: String,
    pub count: u64,
    pub last_asked: DateTime<Utc>,
}

/// Summed question counts for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub count: u64,
}

// =============================================================================
// Transcript
// =============================================================================

/// One line of a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub is_user: bool,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            is_user: true,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            is_user: false,
            text: text.into(),
        }
    }
}
