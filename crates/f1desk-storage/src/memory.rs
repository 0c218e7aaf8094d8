//! In-memory store for Q&A entries and notifications.

use std::sync::RwLock;

use f1desk_core::types::{NewNotification, NewQaEntry, Notification, QaEntry};

use crate::error::StoreError;
use crate::seed::{seed_notifications, seed_questions};
use crate::store::{
    validate_new_entry, validate_new_notification, NotificationStore, QuestionStore,
};

/// Rows plus the id counter for one collection.
struct Table<T> {
    rows: Vec<T>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    /// Hand out the next id. Ids are never reused.
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Volatile store. Reads share the lock; inserts take it exclusively.
#[derive(Default)]
pub struct MemoryStore {
    qa: RwLock<Table<QaEntry>>,
    notifications: RwLock<Table<Notification>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with the literal seed set.
    pub fn seeded() -> Result<Self, StoreError> {
        let store = Self::new();
        for entry in seed_questions() {
            store.create(entry)?;
        }
        for notification in seed_notifications() {
            store.create_notification(notification)?;
        }
        tracing::info!(
            questions = store.qa.read().map(|t| t.rows.len()).unwrap_or(0),
            "In-memory store seeded"
        );
        Ok(store)
    }
}

fn poisoned<E: std::fmt::Display>(what: &str, e: E) -> StoreError {
    StoreError::Unavailable(format!("{} lock poisoned: {}", what, e))
}

impl QuestionStore for MemoryStore {
    fn all(&self) -> Result<Vec<QaEntry>, StoreError> {
        let table = self.qa.read().map_err(|e| poisoned("qa", e))?;
        Ok(table.rows.clone())
    }

    fn by_category(&self, category: &str) -> Result<Vec<QaEntry>, StoreError> {
        let table = self.qa.read().map_err(|e| poisoned("qa", e))?;
        Ok(table
            .rows
            .iter()
            .filter(|qa| qa.category == category)
            .cloned()
            .collect())
    }

    fn get(&self, id: u64) -> Result<QaEntry, StoreError> {
        let table = self.qa.read().map_err(|e| poisoned("qa", e))?;
        table
            .rows
            .iter()
            .find(|qa| qa.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("qa entry {}", id)))
    }

    fn create(&self, entry: NewQaEntry) -> Result<QaEntry, StoreError> {
        validate_new_entry(&entry)?;
        let mut table = self.qa.write().map_err(|e| poisoned("qa", e))?;
        let stored = QaEntry {
            id: table.allocate_id(),
            question: entry.question,
            answer: entry.answer,
            category: entry.category,
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }
}

impl NotificationStore for MemoryStore {
    fn all_notifications(&self) -> Result<Vec<Notification>, StoreError> {
        let table = self
            .notifications
            .read()
            .map_err(|e| poisoned("notifications", e))?;
        Ok(table.rows.clone())
    }

    fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        validate_new_notification(&notification)?;
        let mut table = self
            .notifications
            .write()
            .map_err(|e| poisoned("notifications", e))?;
        let stored = Notification {
            id: table.allocate_id(),
            title: notification.title,
            content: notification.content,
            priority: notification.priority,
            date: notification.date,
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }
}
