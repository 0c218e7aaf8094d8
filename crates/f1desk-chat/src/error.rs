//! Error types for the chat pipeline and its external services.

use std::time::Duration;

use f1desk_storage::StoreError;

/// Failures from an external service (intent classifier or generative
/// responder). Never shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("service misconfigured: {0}")]
    Configuration(String),
    #[error("service rate limited: {0}")]
    RateLimited(String),
    #[error("service timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid service response: {0}")]
    InvalidResponse(String),
}

/// Coarse failure kind used to pick an apology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Configuration,
    RateLimited,
    Unavailable,
}

impl ServiceError {
    pub fn class(&self) -> FailureClass {
        match self {
            ServiceError::Configuration(_) => FailureClass::Configuration,
            ServiceError::RateLimited(_) => FailureClass::RateLimited,
            ServiceError::Unavailable(_)
            | ServiceError::Timeout(_)
            | ServiceError::InvalidResponse(_) => FailureClass::Unavailable,
        }
    }
}

/// Errors returned to callers of the chat orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),
    #[error("a reply is already being composed for session {0}")]
    TurnInFlight(String),
    #[error("session {0} was closed before the reply arrived")]
    SessionClosed(String),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}
