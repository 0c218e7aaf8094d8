//! Conversational core for f1desk.
//!
//! Turns a student's message into a reply by running an ordered set of
//! resolver stages (greeting, intent classifier, curated lookup, generative
//! responder) and falling back to a static referral when none answers.
//! Also owns chat sessions and their transcripts.

pub mod emotion;
pub mod error;
pub mod generative;
pub mod greeting;
mod http;
pub mod intent;
pub mod lookup;
pub mod orchestrator;
pub mod pipeline;
pub mod stage;

#[cfg(test)]
mod test_support;

pub use emotion::{detect_emotion, Emotion};
pub use error::{ChatError, FailureClass, ServiceError};
pub use generative::{GenerativeResponder, OpenAiResponder};
pub use intent::{HttpIntentClassifier, IntentClassifier, IntentMatch};
pub use lookup::ReferenceLibrary;
pub use orchestrator::{ChatOrchestrator, ChatReply, SessionSummary, WELCOME_MESSAGE};
pub use pipeline::{Resolution, ResolutionPipeline, FALLBACK_REPLY};
pub use stage::{
    Answer, AnswerSource, CuratedStage, FailurePolicy, GenerativeStage, GreetingStage,
    IntentStage, ResolverStage, StageOutcome, TrackedQuestion, TurnInput,
};
