//! Shared plumbing for the outbound HTTP clients.

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::ServiceError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest slice of an error body kept in a log message.
const BODY_EXCERPT: usize = 200;

/// Build a client with connect and whole-request deadlines.
pub(crate) fn build_client(request_timeout: Duration) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
        .timeout(request_timeout)
        .build()
        .map_err(|e| ServiceError::Configuration(format!("failed to build HTTP client: {}", e)))
}

/// Classify a non-success response.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> ServiceError {
    let lower = body.to_lowercase();
    let excerpt: String = body.chars().take(BODY_EXCERPT).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ServiceError::Configuration(format!("HTTP {}", status))
        }
        StatusCode::TOO_MANY_REQUESTS => ServiceError::RateLimited(format!("HTTP {}", status)),
        _ if lower.contains("quota") || lower.contains("rate limit") => {
            ServiceError::RateLimited(format!("HTTP {}: {}", status, excerpt))
        }
        _ => ServiceError::Unavailable(format!("HTTP {}: {}", status, excerpt)),
    }
}

/// Classify a transport-level failure.
pub(crate) fn classify_transport(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Unavailable(format!("request timed out: {}", err))
    } else if err.is_decode() {
        ServiceError::InvalidResponse(err.to_string())
    } else {
        ServiceError::Unavailable(err.to_string())
    }
}

/// Turn a response into its decoded JSON body, classifying failures.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, &body));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
}
