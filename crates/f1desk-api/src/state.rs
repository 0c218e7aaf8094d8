//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use f1desk_chat::ChatOrchestrator;
use f1desk_core::config::F1DeskConfig;
use f1desk_storage::{
    AnalyticsCounter, AnalyticsStore, MemoryStore, NotificationStore, QuestionStore, SqliteStore,
    StoreError,
};

/// The three store capabilities, possibly backed by one object.
#[derive(Clone)]
pub struct Stores {
    pub questions: Arc<dyn QuestionStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub analytics: Arc<dyn AnalyticsStore>,
}

impl Stores {
    /// Seeded in-memory Q&A and notifications with an empty counter.
    pub fn memory() -> Result<Self, StoreError> {
        let store = Arc::new(MemoryStore::seeded()?);
        Ok(Self {
            questions: store.clone(),
            notifications: store,
            analytics: Arc::new(AnalyticsCounter::new()),
        })
    }

    /// Every capability served by one SQLite database.
    pub fn sqlite(store: SqliteStore) -> Self {
        let store = Arc::new(store);
        Self {
            questions: store.clone(),
            notifications: store.clone(),
            analytics: store,
        }
    }
}

/// Shared application state. Cloned per request; every field is cheap to
/// clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<F1DeskConfig>,
    pub questions: Arc<dyn QuestionStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub analytics: Arc<dyn AnalyticsStore>,
    pub chat: Arc<ChatOrchestrator>,
    /// Bearer token for write routes.
    pub admin_token: Arc<str>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: F1DeskConfig,
        stores: Stores,
        chat: ChatOrchestrator,
        admin_token: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            questions: stores.questions,
            notifications: stores.notifications,
            analytics: stores.analytics,
            chat: Arc::new(chat),
            admin_token: admin_token.into(),
            start_time: Instant::now(),
        }
    }
}
