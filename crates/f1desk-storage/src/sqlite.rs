//! SQLite-backed store implementing every store capability.
//!
//! All rusqlite faults surface as `StoreError::Unavailable`; only a missing
//! id produces `NotFound`.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row};

use f1desk_core::types::{
    NewNotification, NewQaEntry, Notification, Priority, QaEntry, QuestionAnalyticsRecord,
};

use crate::db::Database;
use crate::error::StoreError;
use crate::seed::{seed_notifications, seed_questions};
use crate::store::{
    question_key, validate_new_entry, validate_new_notification, validate_track,
    AnalyticsStore, NotificationStore, QuestionStore,
};

/// Durable store over a shared [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Open the database file, migrate it, and seed it if it is empty.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let store = Self::new(Arc::new(Database::new(path)?));
        store.seed_if_empty()?;
        Ok(store)
    }

    /// Insert the literal seed set when no Q&A entries exist yet.
    pub fn seed_if_empty(&self) -> Result<bool, StoreError> {
        let count: i64 = self.db.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM qa_entries", [], |row| row.get(0))?)
        })?;
        if count > 0 {
            return Ok(false);
        }
        for entry in seed_questions() {
            self.create(entry)?;
        }
        for notification in seed_notifications() {
            self.create_notification(notification)?;
        }
        tracing::info!("SQLite store seeded");
        Ok(true)
    }
}

fn millis_to_datetime(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {}", ms).into(),
        )
    })
}

fn row_to_qa(row: &Row<'_>) -> rusqlite::Result<QaEntry> {
    Ok(QaEntry {
        id: row.get::<_, i64>(0)? as u64,
        question: row.get(1)?,
        answer: row.get(2)?,
        category: row.get(3)?,
    })
}

fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let priority: String = row.get(3)?;
    let priority = Priority::parse(&priority).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown priority: {}", priority).into(),
        )
    })?;
    Ok(Notification {
        id: row.get::<_, i64>(0)? as u64,
        title: row.get(1)?,
        content: row.get(2)?,
        priority,
        date: millis_to_datetime(4, row.get(4)?)?,
    })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<QuestionAnalyticsRecord> {
    Ok(QuestionAnalyticsRecord {
        id: row.get::<_, i64>(0)? as u64,
        question: row.get(1)?,
        category: row.get(2)?,
        count: row.get::<_, i64>(3)? as u64,
        last_asked: millis_to_datetime(4, row.get(4)?)?,
    })
}

impl QuestionStore for SqliteStore {
    fn all(&self) -> Result<Vec<QaEntry>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, question, answer, category FROM qa_entries ORDER BY id")?;
            let rows = stmt
                .query_map([], row_to_qa)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn by_category(&self, category: &str) -> Result<Vec<QaEntry>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, question, answer, category FROM qa_entries
                 WHERE category = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![category], row_to_qa)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn get(&self, id: u64) -> Result<QaEntry, StoreError> {
        let found = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, question, answer, category FROM qa_entries WHERE id = ?1",
                    rusqlite::params![id as i64],
                    row_to_qa,
                )
                .optional()?)
        })?;
        found.ok_or_else(|| StoreError::NotFound(format!("qa entry {}", id)))
    }

    fn create(&self, entry: NewQaEntry) -> Result<QaEntry, StoreError> {
        validate_new_entry(&entry)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO qa_entries (question, answer, category) VALUES (?1, ?2, ?3)",
                rusqlite::params![entry.question, entry.answer, entry.category],
            )?;
            Ok(QaEntry {
                id: conn.last_insert_rowid() as u64,
                question: entry.question,
                answer: entry.answer,
                category: entry.category,
            })
        })
    }
}

impl NotificationStore for SqliteStore {
    fn all_notifications(&self) -> Result<Vec<Notification>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, priority, date_ms FROM notifications ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], row_to_notification)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        validate_new_notification(&notification)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (title, content, priority, date_ms)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    notification.title,
                    notification.content,
                    notification.priority.as_str(),
                    notification.date.timestamp_millis(),
                ],
            )?;
            Ok(Notification {
                id: conn.last_insert_rowid() as u64,
                title: notification.title,
                content: notification.content,
                priority: notification.priority,
                date: notification.date,
            })
        })
    }
}

impl AnalyticsStore for SqliteStore {
    fn track(&self, question: &str, category: &str) -> Result<(), StoreError> {
        validate_track(question)?;
        let key = question_key(question);
        let now = Utc::now().timestamp_millis();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO question_analytics (question_key, question, category, count, last_asked_ms)
                 VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT(question_key) DO UPDATE SET
                     count = count + 1,
                     last_asked_ms = excluded.last_asked_ms",
                rusqlite::params![key, question, category, now],
            )?;
            Ok(())
        })
    }

    fn all_records(&self) -> Result<Vec<QuestionAnalyticsRecord>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, question, category, count, last_asked_ms
                 FROM question_analytics ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn top_questions(&self, limit: usize) -> Result<Vec<QuestionAnalyticsRecord>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, question, category, count, last_asked_ms
                 FROM question_analytics ORDER BY count DESC, id ASC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![limit], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}
