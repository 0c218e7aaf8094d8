//! API error type and JSON error bodies.
//!
//! Every failure leaves the server as `{ "error": code, "message": text }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use f1desk_chat::ChatError;
use f1desk_storage::StoreError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// 400 - missing or invalid input.
    BadRequest(String),
    /// 404 - resource does not exist.
    NotFound(String),
    /// 409 - the session is busy or went away mid-turn.
    Conflict(String),
    /// 500 - unexpected server error.
    Internal(String),
    /// 503 - backing store not reachable.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal API error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!(error = %msg, "Store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };
        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::InvalidInput(msg) => ApiError::BadRequest(msg),
            StoreError::Unavailable(_) => {
                ApiError::ServiceUnavailable("storage is temporarily unavailable".to_string())
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage
            | ChatError::MessageTooLong(_)
            | ChatError::InvalidSessionId(_) => ApiError::BadRequest(err.to_string()),
            ChatError::TurnInFlight(_) | ChatError::SessionClosed(_) => {
                ApiError::Conflict(err.to_string())
            }
            ChatError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            ChatError::StorageError(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_store_error_statuses() {
        assert_eq!(
            status_of(StoreError::NotFound("qa 9".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(StoreError::InvalidInput("blank".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(StoreError::Unavailable("locked".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_chat_error_statuses() {
        assert_eq!(
            status_of(ChatError::EmptyMessage.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ChatError::TurnInFlight("s".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ChatError::SessionNotFound("s".into()).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_unavailable_hides_details() {
        match ApiError::from(StoreError::Unavailable("/var/db locked".into())) {
            ApiError::ServiceUnavailable(msg) => assert!(!msg.contains("/var/db")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
