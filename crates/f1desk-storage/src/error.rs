//! Error types for the storage layer.

/// Errors from a backing store.
///
/// Backends translate every internal fault (lock poisoning, SQL errors,
/// corrupt rows) into `Unavailable`, keeping it distinct from `NotFound`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<StoreError> for f1desk_core::AppError {
    fn from(err: StoreError) -> Self {
        f1desk_core::AppError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("disk full".to_string());
        assert_eq!(err.to_string(), "store unavailable: disk full");

        let err = StoreError::NotFound("qa entry 7".to_string());
        assert_eq!(err.to_string(), "not found: qa entry 7");

        let err = StoreError::InvalidInput("question must not be empty".to_string());
        assert_eq!(
            err.to_string(),
            "invalid input: question must not be empty"
        );
    }

    #[test]
    fn test_rusqlite_error_is_unavailable() {
        let err: StoreError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_into_app_error() {
        let err: f1desk_core::AppError = StoreError::Unavailable("locked".to_string()).into();
        assert!(err.to_string().contains("locked"));
    }
}
