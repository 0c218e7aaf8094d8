//! Route handler functions for all API endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use f1desk_chat::{ChatReply, SessionSummary};
use f1desk_core::types::{
    AdvisorLink, CategoryTotal, ConversationTurn, NewNotification, NewQaEntry, Notification,
    Priority, QaEntry, QuestionAnalyticsRecord, ADVISOR_LINKS, KNOWN_CATEGORIES,
};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_TOP_LIMIT: i64 = 10;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TopParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub question: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub title: String,
    pub content: String,
    pub priority: Priority,
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub storage_backend: String,
    pub question_count: usize,
    pub active_sessions: usize,
    pub stages: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: String,
    pub label: String,
    pub question_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub session_id: String,
    pub turns: Vec<ConversationTurn>,
}

// =============================================================================
// Health
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    // A store fault should not fail the health check.
    let question_count = state.questions.all().map(|q| q.len()).unwrap_or(0);
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        storage_backend: state.config.storage.backend.clone(),
        question_count,
        active_sessions: state.chat.session_count(),
        stages: state
            .chat
            .pipeline()
            .stage_names()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

// =============================================================================
// Q&A
// =============================================================================

/// GET /api/qa
pub async fn list_qa(State(state): State<AppState>) -> Result<Json<Vec<QaEntry>>, ApiError> {
    Ok(Json(state.questions.all()?))
}

/// GET /api/qa/{category}
pub async fn qa_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<QaEntry>>, ApiError> {
    Ok(Json(state.questions.by_category(&category)?))
}

/// GET /api/qa/entry/{id}
pub async fn get_qa(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<QaEntry>, ApiError> {
    Ok(Json(state.questions.get(id)?))
}

/// POST /api/qa (admin)
pub async fn create_qa(
    State(state): State<AppState>,
    Json(entry): Json<NewQaEntry>,
) -> Result<(StatusCode, Json<QaEntry>), ApiError> {
    let stored = state.questions.create(entry)?;
    tracing::info!(id = stored.id, category = %stored.category, "Q&A entry created");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/categories
pub async fn categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryInfo>>, ApiError> {
    let entries = state.questions.all()?;
    let infos = KNOWN_CATEGORIES
        .iter()
        .map(|c| CategoryInfo {
            id: c.id.to_string(),
            label: c.label.to_string(),
            question_count: entries.iter().filter(|e| e.category == c.id).count(),
        })
        .collect();
    Ok(Json(infos))
}

/// GET /api/advisors
pub async fn advisors() -> Json<&'static [AdvisorLink]> {
    Json(ADVISOR_LINKS)
}

// =============================================================================
// Notifications
// =============================================================================

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.notifications.all_notifications()?))
}

/// POST /api/notifications (admin)
pub async fn create_notification(
    State(state): State<AppState>,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let stored = state.notifications.create_notification(NewNotification {
        title: req.title,
        content: req.content,
        priority: req.priority,
        date: req.date.unwrap_or_else(Utc::now),
    })?;
    tracing::info!(id = stored.id, priority = %stored.priority, "Notification created");
    Ok((StatusCode::CREATED, Json(stored)))
}

// =============================================================================
// Analytics
// =============================================================================

/// GET /api/analytics
pub async fn list_analytics(
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionAnalyticsRecord>>, ApiError> {
    Ok(Json(state.analytics.all_records()?))
}

/// GET /api/analytics/top?limit=N
///
/// A zero or negative limit yields an empty list.
pub async fn top_questions(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
) -> Result<Json<Vec<QuestionAnalyticsRecord>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    let limit = usize::try_from(limit).unwrap_or(0);
    Ok(Json(state.analytics.top_questions(limit)?))
}

/// GET /api/analytics/categories
pub async fn category_totals(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryTotal>>, ApiError> {
    Ok(Json(state.analytics.category_totals()?))
}

/// POST /api/analytics/track
pub async fn track_question(
    State(state): State<AppState>,
    Json(req): Json<TrackRequest>,
) -> Result<Json<TrackResponse>, ApiError> {
    state.analytics.track(&req.question, &req.category)?;
    Ok(Json(TrackResponse { success: true }))
}

// =============================================================================
// Chat
// =============================================================================

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let reply = state
        .chat
        .handle_message(&req.message, req.session_id.as_deref())
        .await?;
    tracing::debug!(session = %reply.session_id, source = ?reply.source, "Chat reply sent");
    Ok(Json(reply))
}

/// GET /api/chat/{session_id}
pub async fn chat_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let turns = state.chat.transcript(&session_id)?;
    Ok(Json(TranscriptResponse { session_id, turns }))
}

/// DELETE /api/chat/{session_id}
pub async fn end_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.chat.end_session(&session_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/sessions (admin)
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(state.chat.list_sessions())
}
