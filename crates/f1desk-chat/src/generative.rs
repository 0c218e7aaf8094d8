//! Free-form answer generation through an OpenAI-compatible chat API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use f1desk_core::config::GenerativeConfig;

use crate::error::ServiceError;
use crate::http::{build_client, classify_transport, read_json};

/// Instructions sent ahead of every user question.
pub const SYSTEM_PROMPT: &str = "You are a knowledgeable assistant for international students \
holding F-1 visas in the United States. Answer questions about maintaining status, \
work authorization (CPT and OPT), enrollment requirements, travel, and related \
immigration rules accurately and concisely. When a question depends on individual \
circumstances or you are not certain, say so and recommend the student confirm with \
their school's Designated School Official (DSO).";

/// Produces a free-form answer to a question.
///
/// An empty string is a valid result; the caller decides what to show.
#[async_trait]
pub trait GenerativeResponder: Send + Sync {
    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String, ServiceError>;
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Responder for any endpoint speaking the `/chat/completions` protocol.
pub struct OpenAiResponder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl std::fmt::Debug for OpenAiResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiResponder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiResponder {
    pub fn from_config(config: &GenerativeConfig, timeout: Duration) -> Result<Self, ServiceError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ServiceError::Configuration("generative API key not set".to_string()))?;
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl GenerativeResponder for OpenAiResponder {
    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String, ServiceError> {
        let context_note = context
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!("Reference material that may help:\n\n{}", c));

        let mut messages = vec![ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT,
        }];
        if let Some(note) = context_note.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: note,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let parsed: CompletionResponse = read_json(response).await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::InvalidResponse("no choices returned".to_string()))?;
        let text = choice
            .message
            .and_then(|m| m.content)
            .unwrap_or_default()
            .trim()
            .to_string();
        tracing::debug!(model = %self.model, chars = text.len(), "Completion received");
        Ok(text)
    }
}
