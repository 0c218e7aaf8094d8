//! f1desk storage crate - curated Q&A, notifications, question analytics.
//!
//! Defines the store capabilities the response pipeline and HTTP layer
//! depend on, an in-memory backend seeded at startup, and a SQLite backend
//! that can be swapped in without touching the pipeline.

pub mod analytics;
pub mod db;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod seed;
pub mod sqlite;
pub mod store;

pub use analytics::AnalyticsCounter;
pub use db::Database;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use seed::{reference_passages, seed_notifications, seed_questions};
pub use sqlite::SqliteStore;
pub use store::{AnalyticsStore, NotificationStore, QuestionStore};
