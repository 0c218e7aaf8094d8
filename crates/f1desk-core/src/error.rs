use thiserror::Error;

/// Top-level error type for the f1desk service.
///
/// Subsystem crates define their own error types; the ones that cross into
/// startup or server code convert into `AppError` so the binary can use `?`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for service startup and configuration.
pub type Result<T> = std::result::Result<T, AppError>;
