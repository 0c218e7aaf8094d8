//! Intent classification.
//!
//! [`HttpIntentClassifier`] talks to a Dialogflow-style `detectIntent`
//! endpoint. A reply without a `queryResult` is treated as a failure rather
//! than an empty match.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use f1desk_core::config::IntentConfig;

use crate::error::ServiceError;
use crate::http::{build_client, classify_transport, read_json};

/// What the classifier made of one message.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentMatch {
    /// Canned answer configured for the intent; may be empty.
    pub fulfillment_text: String,
    /// Display name of the matched intent, when there was one.
    pub intent_name: Option<String>,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Maps free text to a named intent with a confidence score.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str, session_id: &str) -> Result<IntentMatch, ServiceError>;
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentResponse {
    query_result: Option<QueryResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    fulfillment_text: String,
    intent: Option<IntentRef>,
    #[serde(default)]
    intent_detection_confidence: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntentRef {
    #[serde(default)]
    display_name: String,
}

impl TryFrom<DetectIntentResponse> for IntentMatch {
    type Error = ServiceError;

    fn try_from(resp: DetectIntentResponse) -> Result<Self, Self::Error> {
        let result = resp
            .query_result
            .ok_or_else(|| ServiceError::InvalidResponse("missing queryResult".to_string()))?;
        Ok(IntentMatch {
            fulfillment_text: result.fulfillment_text,
            intent_name: result
                .intent
                .map(|i| i.display_name)
                .filter(|name| !name.is_empty()),
            confidence: result.intent_detection_confidence.clamp(0.0, 1.0),
        })
    }
}

// =============================================================================
// HTTP client
// =============================================================================

/// Classifier backed by the Dialogflow v2 REST API.
pub struct HttpIntentClassifier {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    access_token: String,
    language_code: String,
}

impl std::fmt::Debug for HttpIntentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIntentClassifier")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl HttpIntentClassifier {
    /// Build from config. Fails when the project or token is missing.
    pub fn from_config(config: &IntentConfig, timeout: Duration) -> Result<Self, ServiceError> {
        let project_id = config
            .project_id
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ServiceError::Configuration("intent project id not set".to_string()))?;
        let access_token = config
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ServiceError::Configuration("intent access token not set".to_string())
            })?;
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id,
            access_token,
            language_code: config.language_code.clone(),
        })
    }

    fn endpoint(&self, session_id: &str) -> String {
        format!(
            "{}/projects/{}/agent/sessions/{}:detectIntent",
            self.base_url, self.project_id, session_id
        )
    }
}

#[async_trait]
impl IntentClassifier for HttpIntentClassifier {
    async fn classify(&self, text: &str, session_id: &str) -> Result<IntentMatch, ServiceError> {
        let body = json!({
            "queryInput": {
                "text": {
                    "text": text,
                    "languageCode": self.language_code,
                }
            }
        });

        let response = self
            .client
            .post(self.endpoint(session_id))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let parsed: DetectIntentResponse = read_json(response).await?;
        let result = IntentMatch::try_from(parsed)?;
        tracing::debug!(
            intent = ?result.intent_name,
            confidence = result.confidence,
            "Intent classified"
        );
        Ok(result)
    }
}
