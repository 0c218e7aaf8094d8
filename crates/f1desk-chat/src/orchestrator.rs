//! Chat orchestrator: owns session transcripts and runs each user message
//! through the resolution pipeline.
//!
//! One turn may be in flight per session. While a reply is being composed
//! the transcript ends with a placeholder turn; when the reply arrives it
//! replaces that placeholder by position. If the turn is abandoned (the
//! caller's future is dropped) the placeholder is removed again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use f1desk_core::types::ConversationTurn;

use crate::emotion::{detect_emotion, Emotion};
use crate::error::ChatError;
use crate::pipeline::ResolutionPipeline;
use crate::stage::AnswerSource;

/// First line of every transcript.
pub const WELCOME_MESSAGE: &str = "Hi! I'm your F1 visa assistant. How can I help you today?";

/// Stand-in assistant turn while a reply is being composed.
pub const PENDING_REPLY: &str = "...";

/// Longest accepted client-supplied session id.
const MAX_SESSION_ID_LEN: usize = 64;

/// Reply to one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub session_id: String,
    pub reply: String,
    pub emotion: Emotion,
    pub source: AnswerSource,
}

/// Snapshot of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub turn_count: usize,
    pub in_flight: bool,
}

struct SessionState {
    /// Distinguishes a session from a later one reusing the same id.
    epoch: u64,
    transcript: Vec<ConversationTurn>,
    in_flight: bool,
    started_at: DateTime<Utc>,
    last_message_at: DateTime<Utc>,
}

impl SessionState {
    fn new(epoch: u64) -> Self {
        let now = Utc::now();
        Self {
            epoch,
            transcript: vec![ConversationTurn::assistant(WELCOME_MESSAGE)],
            in_flight: false,
            started_at: now,
            last_message_at: now,
        }
    }
}

/// Coordinates sessions and the resolution pipeline.
pub struct ChatOrchestrator {
    pipeline: ResolutionPipeline,
    sessions: Mutex<HashMap<String, SessionState>>,
    next_epoch: AtomicU64,
    max_message_length: usize,
}

impl ChatOrchestrator {
    pub fn new(pipeline: ResolutionPipeline, max_message_length: usize) -> Self {
        Self {
            pipeline,
            sessions: Mutex::new(HashMap::new()),
            next_epoch: AtomicU64::new(1),
            max_message_length,
        }
    }

    pub fn pipeline(&self) -> &ResolutionPipeline {
        &self.pipeline
    }

    /// Handle one user message.
    ///
    /// Creates the session on first use. A missing `session_id` gets a
    /// fresh UUID.
    pub async fn handle_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        let sid = match session_id {
            Some(id) => validate_session_id(id)?.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let mut turn = self.begin_turn(&sid, message)?;

        // Blank input was rejected above, so the pipeline always answers.
        let resolution = self
            .pipeline
            .select(message, &sid)
            .await
            .ok_or(ChatError::EmptyMessage)?;

        turn.complete(&resolution.reply, || {
            self.pipeline.record(resolution.tracked.as_ref())
        })?;

        Ok(ChatReply {
            session_id: sid,
            emotion: detect_emotion(&resolution.reply),
            reply: resolution.reply,
            source: resolution.source,
        })
    }

    /// Full transcript for a session.
    pub fn transcript(&self, session_id: &str) -> Result<Vec<ConversationTurn>, ChatError> {
        let sessions = self.lock_sessions()?;
        sessions
            .get(session_id)
            .map(|s| s.transcript.clone())
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))
    }

    /// Drop a session. A reply still in flight for it is discarded.
    pub fn end_session(&self, session_id: &str) -> Result<(), ChatError> {
        let mut sessions = self.lock_sessions()?;
        if sessions.remove(session_id).is_some() {
            tracing::debug!(session = %session_id, "Session ended");
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(session_id.to_string()))
        }
    }

    /// Summaries of all live sessions, most recently active first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = match self.sessions.lock() {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .map(|(id, s)| SessionSummary {
                id: id.clone(),
                started_at: s.started_at,
                last_message_at: s.last_message_at,
                turn_count: s.transcript.len(),
                in_flight: s.in_flight,
            })
            .collect();
        summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        summaries
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Remove sessions idle for longer than `max_idle`. Sessions with a turn
    /// in flight are kept. Returns how many were removed.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let cutoff = Utc::now() - max_idle;
        let Ok(mut sessions) = self.sessions.lock() else {
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, s| s.in_flight || s.last_message_at > cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, remaining = sessions.len(), "Pruned idle chat sessions");
        }
        removed
    }

    // -- Private helpers --

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionState>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))
    }

    /// Append the user turn and the placeholder, and mark the session busy.
    fn begin_turn(&self, session_id: &str, message: &str) -> Result<TurnGuard<'_>, ChatError> {
        let mut sessions = self.lock_sessions()?;
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| {
            tracing::debug!(session = %session_id, "Session created");
            SessionState::new(self.next_epoch.fetch_add(1, Ordering::Relaxed))
        });

        if session.in_flight {
            return Err(ChatError::TurnInFlight(session_id.to_string()));
        }

        session.transcript.push(ConversationTurn::user(message));
        session.transcript.push(ConversationTurn::assistant(PENDING_REPLY));
        session.in_flight = true;
        session.last_message_at = Utc::now();

        Ok(TurnGuard {
            orchestrator: self,
            session_id: session_id.to_string(),
            epoch: session.epoch,
            slot: session.transcript.len() - 1,
            done: false,
        })
    }
}

/// Session ids are opaque but travel in URLs, so keep them URL-safe.
fn validate_session_id(id: &str) -> Result<&str, ChatError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(ChatError::InvalidSessionId(id.to_string()))
    }
}

// =============================================================================
// TurnGuard
// =============================================================================

/// Owns the placeholder slot for one in-flight turn.
struct TurnGuard<'a> {
    orchestrator: &'a ChatOrchestrator,
    session_id: String,
    epoch: u64,
    slot: usize,
    done: bool,
}

impl TurnGuard<'_> {
    /// Replace the placeholder with the reply and release the session.
    ///
    /// `on_live` runs only when the turn still belongs to a live session.
    fn complete(&mut self, reply: &str, on_live: impl FnOnce()) -> Result<(), ChatError> {
        self.done = true;
        let mut sessions = self.orchestrator.lock_sessions()?;
        let session = sessions
            .get_mut(&self.session_id)
            .filter(|s| s.epoch == self.epoch)
            .ok_or_else(|| ChatError::SessionClosed(self.session_id.clone()))?;

        on_live();
        if let Some(turn) = session.transcript.get_mut(self.slot) {
            *turn = ConversationTurn::assistant(reply);
        }
        session.in_flight = false;
        session.last_message_at = Utc::now();
        Ok(())
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let Ok(mut sessions) = self.orchestrator.sessions.lock() else {
            return;
        };
        if let Some(session) = sessions.get_mut(&self.session_id) {
            if session.epoch != self.epoch {
                return;
            }
            let is_placeholder = session
                .transcript
                .get(self.slot)
                .is_some_and(|t| !t.is_user && t.text == PENDING_REPLY);
            if is_placeholder {
                session.transcript.remove(self.slot);
            }
            session.in_flight = false;
            tracing::debug!(session = %self.session_id, "Abandoned turn cleaned up");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::generative::GenerativeResponder;
    use crate::pipeline::FALLBACK_REPLY;
    use crate::intent::IntentClassifier;
    use crate::test_support::{FakeClassifier, FakeResponder};
    use f1desk_core::config::ChatConfig;
    use f1desk_storage::{AnalyticsCounter, MemoryStore};

    fn orchestrator_with(responder: Option<FakeResponder>) -> ChatOrchestrator {
        let pipeline = ResolutionPipeline::standard(
            &ChatConfig::default(),
            Arc::new(MemoryStore::seeded().unwrap()),
            Arc::new(AnalyticsCounter::new()),
            None,
            responder.map(|r| Arc::new(r) as Arc<dyn GenerativeResponder>),
        );
        ChatOrchestrator::new(pipeline, 2000)
    }

    fn orchestrator() -> ChatOrchestrator {
        orchestrator_with(None)
    }

    // ---- Validation ----

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let orch = orchestrator();
        assert!(matches!(
            orch.handle_message("   ", None).await,
            Err(ChatError::EmptyMessage)
        ));
        assert_eq!(orch.session_count(), 0);
    }

    #[tokio::test]
    async fn test_message_too_long() {
        let orch = orchestrator();
        let long = "a".repeat(2001);
        assert!(matches!(
            orch.handle_message(&long, None).await,
            Err(ChatError::MessageTooLong(2000))
        ));
        let max = "é".repeat(2000);
        assert!(orch.handle_message(&max, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_session_id() {
        let orch = orchestrator();
        let too_long = "x".repeat(65);
        for bad in ["", "has space", "../etc", too_long.as_str()] {
            assert!(matches!(
                orch.handle_message("hi", Some(bad)).await,
                Err(ChatError::InvalidSessionId(_))
            ));
        }
    }

    // ---- Transcript ----

    #[tokio::test]
    async fn test_new_session_transcript() {
        let orch = orchestrator();
        let reply = orch.handle_message("What is OPT?", None).await.unwrap();
        assert!(Uuid::parse_str(&reply.session_id).is_ok());
        assert_eq!(reply.source, AnswerSource::Curated);

        let transcript = orch.transcript(&reply.session_id).unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0], ConversationTurn::assistant(WELCOME_MESSAGE));
        assert_eq!(transcript[1], ConversationTurn::user("What is OPT?"));
        assert_eq!(transcript[2], ConversationTurn::assistant(reply.reply));
    }

    #[tokio::test]
    async fn test_session_reuse_appends() {
        let orch = orchestrator();
        orch.handle_message("hello", Some("abc")).await.unwrap();
        orch.handle_message("What is CPT?", Some("abc")).await.unwrap();
        let transcript = orch.transcript("abc").unwrap();
        assert_eq!(transcript.len(), 5);
        assert!(transcript.iter().all(|t| t.text != PENDING_REPLY));
        assert_eq!(orch.session_count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_reply_and_emotion() {
        let orch = orchestrator();
        let reply = orch
            .handle_message("Tell me about the weather on Mars", None)
            .await
            .unwrap();
        assert_eq!(reply.reply, FALLBACK_REPLY);
        assert_eq!(reply.source, AnswerSource::Fallback);
        assert_eq!(reply.emotion, detect_emotion(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn test_greeting_reply_emotion() {
        let orch = orchestrator();
        let reply = orch.handle_message("hey", None).await.unwrap();
        assert_eq!(reply.source, AnswerSource::Greeting);
        assert_eq!(reply.emotion, detect_emotion(&reply.reply));
    }

    // ---- In-flight handling ----

    #[tokio::test]
    async fn test_concurrent_send_rejected() {
        let orch = Arc::new(orchestrator_with(Some(
            FakeResponder::replying("slow answer").with_delay(Duration::from_millis(300)),
        )));

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.handle_message("zzz unmatched", Some("s1")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = orch.handle_message("zzz again", Some("s1")).await;
        assert!(matches!(second, Err(ChatError::TurnInFlight(_))));

        let transcript = orch.transcript("s1").unwrap();
        assert_eq!(transcript.last().unwrap().text, PENDING_REPLY);

        let reply = first.await.unwrap().unwrap();
        assert_eq!(reply.reply, "slow answer");
        let transcript = orch.transcript("s1").unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2].text, "slow answer");
    }

    #[tokio::test]
    async fn test_cancelled_turn_removes_placeholder() {
        let orch = orchestrator_with(Some(
            FakeResponder::replying("never").with_delay(Duration::from_secs(10)),
        ));
        let result = tokio::time::timeout(
            Duration::from_millis(50),
            orch.handle_message("zzz unmatched", Some("s2")),
        )
        .await;
        assert!(result.is_err());

        let transcript = orch.transcript("s2").unwrap();
        assert_eq!(transcript.len(), 2);
        assert!(transcript[1].is_user);

        // The session accepts a new turn afterwards.
        let reply = orch.handle_message("What is OPT?", Some("s2")).await.unwrap();
        assert_eq!(reply.source, AnswerSource::Curated);
    }

    #[tokio::test]
    async fn test_end_session_discards_in_flight_reply() {
        let orch = Arc::new(orchestrator_with(Some(
            FakeResponder::replying("late").with_delay(Duration::from_millis(200)),
        )));
        let pending = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.handle_message("zzz unmatched", Some("s3")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        orch.end_session("s3").unwrap();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(ChatError::SessionClosed(_))));
        assert!(matches!(
            orch.transcript("s3"),
            Err(ChatError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reply_for_closed_session_does_not_touch_new_one() {
        let orch = Arc::new(orchestrator_with(Some(
            FakeResponder::replying("late").with_delay(Duration::from_millis(200)),
        )));
        let pending = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.handle_message("zzz unmatched", Some("s4")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        orch.end_session("s4").unwrap();
        orch.handle_message("hello", Some("s4")).await.unwrap();

        assert!(pending.await.unwrap().is_err());
        let transcript = orch.transcript("s4").unwrap();
        assert_eq!(transcript.len(), 3);
        assert!(transcript.iter().all(|t| t.text != "late"));
    }

    #[tokio::test]
    async fn test_end_session_skips_analytics_for_dropped_reply() {
        let analytics = Arc::new(AnalyticsCounter::new());
        let classifier =
            FakeClassifier::answering("OPT is work authorization.", Some("opt_info"), 0.99)
                .with_delay(Duration::from_millis(200));
        let pipeline = ResolutionPipeline::standard(
            &ChatConfig::default(),
            Arc::new(MemoryStore::seeded().unwrap()),
            analytics.clone(),
            Some(Arc::new(classifier) as Arc<dyn IntentClassifier>),
            None,
        );
        let orch = Arc::new(ChatOrchestrator::new(pipeline, 2000));

        let pending = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.handle_message("Tell me about OPT", Some("s5")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        orch.end_session("s5").unwrap();

        assert!(matches!(pending.await.unwrap(), Err(ChatError::SessionClosed(_))));
        assert!(analytics.is_empty());

        // A turn that lands is still counted.
        orch.handle_message("Tell me about OPT", Some("s6")).await.unwrap();
        assert_eq!(analytics.len(), 1);
    }

    // ---- Session management ----

    #[tokio::test]
    async fn test_end_unknown_session() {
        let orch = orchestrator();
        assert!(matches!(
            orch.end_session("nope"),
            Err(ChatError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_and_prune_sessions() {
        let orch = orchestrator();
        orch.handle_message("hi", Some("a")).await.unwrap();
        orch.handle_message("hi", Some("b")).await.unwrap();

        let sessions = orch.list_sessions();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].turn_count, 3);

        assert_eq!(orch.prune_idle(Duration::from_secs(3600)), 0);
        assert_eq!(orch.prune_idle(Duration::ZERO), 2);
        assert_eq!(orch.session_count(), 0);
    }
}
