//! Fakes shared by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use f1desk_core::types::QuestionAnalyticsRecord;
use f1desk_storage::{AnalyticsStore, StoreError};

use crate::error::ServiceError;
use crate::generative::GenerativeResponder;
use crate::intent::{IntentClassifier, IntentMatch};

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub struct FakeClassifier {
    result: Result<IntentMatch, ServiceError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_text: Mutex<Option<String>>,
}

impl FakeClassifier {
    pub fn answering(text: &str, intent: Option<&str>, confidence: f32) -> Self {
        Self::with_result(Ok(IntentMatch {
            fulfillment_text: text.to_string(),
            intent_name: intent.map(str::to_string),
            confidence,
        }))
    }

    pub fn no_match() -> Self {
        Self::answering("", None, 0.0)
    }

    pub fn failing() -> Self {
        Self::with_result(Err(ServiceError::Unavailable("classifier down".into())))
    }

    fn with_result(result: Result<IntentMatch, ServiceError>) -> Self {
        Self {
            result,
            delay: None,
            calls: AtomicUsize::new(0),
            last_text: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_text.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for FakeClassifier {
    async fn classify(&self, text: &str, _session_id: &str) -> Result<IntentMatch, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_text.lock().unwrap() = Some(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

pub struct FakeResponder {
    result: Result<String, ServiceError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_context: Mutex<Option<String>>,
}

impl FakeResponder {
    pub fn replying(text: &str) -> Self {
        Self::with_result(Ok(text.to_string()))
    }

    pub fn failing(err: ServiceError) -> Self {
        Self::with_result(Err(err))
    }

    fn with_result(result: Result<String, ServiceError>) -> Self {
        Self {
            result,
            delay: None,
            calls: AtomicUsize::new(0),
            last_context: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_context(&self) -> Option<String> {
        self.last_context.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeResponder for FakeResponder {
    async fn generate(&self, _prompt: &str, context: Option<&str>) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.lock().unwrap() = context.map(str::to_string);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// Analytics sink whose writes always fail.
pub struct FailingAnalytics;

impl AnalyticsStore for FailingAnalytics {
    fn track(&self, _question: &str, _category: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("analytics offline".into()))
    }

    fn all_records(&self) -> Result<Vec<QuestionAnalyticsRecord>, StoreError> {
        Ok(Vec::new())
    }
}
