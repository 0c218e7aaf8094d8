//! Response resolution pipeline.
//!
//! Runs the stages in order until one answers. Every stage call is bounded
//! by a deadline; an expired deadline counts as a failure of that stage.
//! Analytics for the winning answer are recorded before the reply is
//! returned, and a tracking failure never blocks the reply.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use f1desk_core::config::ChatConfig;
use f1desk_storage::{reference_passages, AnalyticsStore, QuestionStore};

use crate::error::{FailureClass, ServiceError};
use crate::generative::GenerativeResponder;
use crate::intent::IntentClassifier;
use crate::lookup::ReferenceLibrary;
use crate::stage::{
    Answer, AnswerSource, CuratedStage, FailurePolicy, GenerativeStage, GreetingStage,
    IntentStage, ResolverStage, StageOutcome, TrackedQuestion, TurnInput,
};

/// Static reply when no stage answers.
pub const FALLBACK_REPLY: &str = "I'm not sure about that. Please contact your DSO for specific \
guidance, or visit https://studyinthestates.dhs.gov/students";

pub const CONFIGURATION_APOLOGY: &str = "I apologize, but there seems to be an issue with the AI \
service configuration. Please try again later.";

pub const RATE_LIMIT_APOLOGY: &str = "I apologize, but the AI service is temporarily unavailable \
due to high demand. Please try again in a few moments.";

pub const GENERIC_APOLOGY: &str = "I apologize, but I'm having trouble processing your request \
right now. Please try again or rephrase your question.";

/// Apology text for a failure class.
pub fn apology_for(class: FailureClass) -> &'static str {
    match class {
        FailureClass::Configuration => CONFIGURATION_APOLOGY,
        FailureClass::RateLimited => RATE_LIMIT_APOLOGY,
        FailureClass::Unavailable => GENERIC_APOLOGY,
    }
}

/// The chosen reply for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub reply: String,
    pub source: AnswerSource,
    /// Question counted in analytics, if any.
    pub tracked: Option<TrackedQuestion>,
}

impl From<Answer> for Resolution {
    fn from(answer: Answer) -> Self {
        Self {
            reply: answer.text,
            source: answer.source,
            tracked: answer.track,
        }
    }
}

/// Ordered resolver stages plus the analytics sink.
pub struct ResolutionPipeline {
    stages: Vec<Box<dyn ResolverStage>>,
    analytics: Arc<dyn AnalyticsStore>,
    stage_timeout: Duration,
}

impl ResolutionPipeline {
    /// An empty pipeline; every message gets the static fallback.
    pub fn new(analytics: Arc<dyn AnalyticsStore>, stage_timeout: Duration) -> Self {
        Self {
            stages: Vec::new(),
            analytics,
            stage_timeout,
        }
    }

    /// Append a stage. Stages run in the order they are added.
    pub fn with_stage<S: ResolverStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Greeting, intent, curated, generative. The optional services are
    /// skipped when not supplied.
    pub fn standard(
        config: &ChatConfig,
        store: Arc<dyn QuestionStore>,
        analytics: Arc<dyn AnalyticsStore>,
        classifier: Option<Arc<dyn IntentClassifier>>,
        responder: Option<Arc<dyn GenerativeResponder>>,
    ) -> Self {
        let mut pipeline = Self::new(analytics, Duration::from_secs(config.stage_timeout_secs))
            .with_stage(GreetingStage);

        if let Some(classifier) = classifier {
            pipeline = pipeline.with_stage(IntentStage::new(classifier, config.confidence_threshold));
        }
        pipeline = pipeline.with_stage(CuratedStage::new(store, config.keyword_fallback));
        if let Some(responder) = responder {
            let mut stage = GenerativeStage::new(responder);
            if config.reference_context {
                stage = stage.with_references(ReferenceLibrary::new(reference_passages()));
            }
            pipeline = pipeline.with_stage(stage);
        }
        pipeline
    }

    /// Names of the configured stages, in run order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Resolve one message and record its analytics. Returns `None` for
    /// blank input.
    pub async fn resolve(&self, raw: &str, session_id: &str) -> Option<Resolution> {
        let resolution = self.select(raw, session_id).await?;
        self.record(resolution.tracked.as_ref());
        Some(resolution)
    }

    /// Pick the reply without touching analytics. Callers that may drop the
    /// reply record it themselves with [`Self::record`].
    pub async fn select(&self, raw: &str, session_id: &str) -> Option<Resolution> {
        let input = TurnInput::new(raw, session_id);
        if input.text.is_empty() {
            return None;
        }

        for stage in &self.stages {
            let outcome = match tokio::time::timeout(self.stage_timeout, stage.resolve(&input)).await
            {
                Ok(outcome) => outcome,
                Err(_) => StageOutcome::Failed(ServiceError::Timeout(self.stage_timeout)),
            };

            match outcome {
                StageOutcome::Answered(answer) => {
                    debug!(stage = stage.name(), session = %session_id, "Stage answered");
                    return Some(answer.into());
                }
                StageOutcome::Skip => continue,
                StageOutcome::Failed(err) => match stage.failure_policy() {
                    FailurePolicy::FallThrough => {
                        warn!(stage = stage.name(), error = %err, "Stage failed, trying next");
                    }
                    FailurePolicy::Apologize => {
                        warn!(stage = stage.name(), error = %err, "Stage failed, apologizing");
                        return Some(Resolution {
                            reply: apology_for(err.class()).to_string(),
                            source: AnswerSource::Apology,
                            tracked: None,
                        });
                    }
                },
            }
        }

        debug!(session = %session_id, "No stage answered, using fallback");
        Some(Resolution {
            reply: FALLBACK_REPLY.to_string(),
            source: AnswerSource::Fallback,
            tracked: None,
        })
    }

    /// Count a tracked question. Failures are logged, never surfaced.
    pub fn record(&self, track: Option<&TrackedQuestion>) {
        let Some(track) = track else {
            return;
        };
        if let Err(e) = self.analytics.track(&track.question, &track.category) {
            warn!(question = %track.question, error = %e, "Failed to record question analytics");
        }
    }
}
