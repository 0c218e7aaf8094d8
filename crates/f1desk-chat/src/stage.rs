//! Resolver stages.
//!
//! Each stage either answers, passes, or fails. What happens after a failure
//! is the stage's own [`FailurePolicy`]; the driver in
//! [`crate::pipeline`] only applies it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use f1desk_storage::QuestionStore;

use crate::error::ServiceError;
use crate::generative::GenerativeResponder;
use crate::greeting::{greeting_reply, is_greeting};
use crate::intent::IntentClassifier;
use crate::lookup::{find_curated, ReferenceLibrary};

/// Shown when the generative responder returns nothing.
pub const NO_GENERATION_REPLY: &str =
    "I apologize, but I couldn't generate a response. Please try rephrasing your question.";

/// Which step produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Greeting,
    Intent,
    Curated,
    Generative,
    Apology,
    Fallback,
}

/// A question to count in analytics once the reply is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedQuestion {
    pub question: String,
    pub category: String,
}

/// A reply produced by a stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
    pub track: Option<TrackedQuestion>,
}

impl Answer {
    pub fn new(text: impl Into<String>, source: AnswerSource) -> Self {
        Self {
            text: text.into(),
            source,
            track: None,
        }
    }

    pub fn tracked(mut self, question: impl Into<String>, category: impl Into<String>) -> Self {
        self.track = Some(TrackedQuestion {
            question: question.into(),
            category: category.into(),
        });
        self
    }
}

/// Result of running one stage.
#[derive(Debug)]
pub enum StageOutcome {
    Answered(Answer),
    Skip,
    Failed(ServiceError),
}

/// What the driver does when a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and try the next stage.
    FallThrough,
    /// Stop and reply with an apology matched to the failure class.
    Apologize,
}

/// The message a stage sees.
#[derive(Debug, Clone)]
pub struct TurnInput {
    /// Exactly as the user typed it.
    pub raw: String,
    /// Trimmed form used for matching and outbound calls.
    pub text: String,
    pub session_id: String,
}

impl TurnInput {
    pub fn new(raw: impl Into<String>, session_id: impl Into<String>) -> Self {
        let raw = raw.into();
        let text = raw.trim().to_string();
        Self {
            raw,
            text,
            session_id: session_id.into(),
        }
    }
}

#[async_trait]
pub trait ResolverStage: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::FallThrough
    }

    async fn resolve(&self, input: &TurnInput) -> StageOutcome;
}

// =============================================================================
// Greeting
// =============================================================================

#[derive(Debug, Default)]
pub struct GreetingStage;

#[async_trait]
impl ResolverStage for GreetingStage {
    fn name(&self) -> &'static str {
        "greeting"
    }

    async fn resolve(&self, input: &TurnInput) -> StageOutcome {
        if is_greeting(&input.text) {
            StageOutcome::Answered(Answer::new(greeting_reply(), AnswerSource::Greeting))
        } else {
            StageOutcome::Skip
        }
    }
}

// =============================================================================
// Intent classifier
// =============================================================================

/// Uses the classifier's canned answer when it is confident enough.
pub struct IntentStage {
    classifier: Arc<dyn IntentClassifier>,
    threshold: f32,
}

impl IntentStage {
    pub fn new(classifier: Arc<dyn IntentClassifier>, threshold: f32) -> Self {
        Self {
            classifier,
            threshold,
        }
    }
}

#[async_trait]
impl ResolverStage for IntentStage {
    fn name(&self) -> &'static str {
        "intent"
    }

    async fn resolve(&self, input: &TurnInput) -> StageOutcome {
        let matched = match self.classifier.classify(&input.text, &input.session_id).await {
            Ok(m) => m,
            Err(e) => return StageOutcome::Failed(e),
        };

        if matched.confidence <= self.threshold || matched.fulfillment_text.trim().is_empty() {
            tracing::debug!(
                confidence = matched.confidence,
                threshold = self.threshold,
                "Intent match below threshold or empty"
            );
            return StageOutcome::Skip;
        }

        let mut answer = Answer::new(matched.fulfillment_text, AnswerSource::Intent);
        if let Some(name) = matched.intent_name {
            answer = answer.tracked(input.raw.clone(), name);
        }
        StageOutcome::Answered(answer)
    }
}

// =============================================================================
// Curated lookup
// =============================================================================

/// Answers from the curated Q&A store.
pub struct CuratedStage {
    store: Arc<dyn QuestionStore>,
    keyword_fallback: bool,
}

impl CuratedStage {
    pub fn new(store: Arc<dyn QuestionStore>, keyword_fallback: bool) -> Self {
        Self {
            store,
            keyword_fallback,
        }
    }
}

#[async_trait]
impl ResolverStage for CuratedStage {
    fn name(&self) -> &'static str {
        "curated"
    }

    async fn resolve(&self, input: &TurnInput) -> StageOutcome {
        let entries = match self.store.all() {
            Ok(entries) => entries,
            Err(e) => {
                return StageOutcome::Failed(ServiceError::Unavailable(format!(
                    "curated store: {}",
                    e
                )))
            }
        };

        match find_curated(&input.text, &entries, self.keyword_fallback) {
            Some(entry) => StageOutcome::Answered(
                Answer::new(entry.answer.clone(), AnswerSource::Curated)
                    .tracked(entry.question.clone(), entry.category.clone()),
            ),
            None => StageOutcome::Skip,
        }
    }
}

// =============================================================================
// Generative responder
// =============================================================================

/// Last resort before the static fallback. Failures end the turn with an
/// apology instead of falling through.
pub struct GenerativeStage {
    responder: Arc<dyn GenerativeResponder>,
    references: Option<ReferenceLibrary>,
}

impl GenerativeStage {
    pub fn new(responder: Arc<dyn GenerativeResponder>) -> Self {
        Self {
            responder,
            references: None,
        }
    }

    /// Attach passages offered to the responder as context.
    pub fn with_references(mut self, references: ReferenceLibrary) -> Self {
        self.references = Some(references);
        self
    }
}

#[async_trait]
impl ResolverStage for GenerativeStage {
    fn name(&self) -> &'static str {
        "generative"
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Apologize
    }

    async fn resolve(&self, input: &TurnInput) -> StageOutcome {
        let context = self
            .references
            .as_ref()
            .and_then(|lib| lib.context_for(&input.text));

        match self.responder.generate(&input.text, context.as_deref()).await {
            Ok(text) if text.trim().is_empty() => StageOutcome::Answered(Answer::new(
                NO_GENERATION_REPLY,
                AnswerSource::Generative,
            )),
            Ok(text) => StageOutcome::Answered(Answer::new(text, AnswerSource::Generative)),
            Err(e) => StageOutcome::Failed(e),
        }
    }
}
