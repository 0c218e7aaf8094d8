//! Store capabilities shared by every backend.
//!
//! The pipeline and HTTP handlers hold these as trait objects so a durable
//! backend can replace the in-memory one without code changes.

use std::collections::BTreeMap;

use f1desk_core::types::{
    CategoryTotal, NewNotification, NewQaEntry, Notification, QaEntry, QuestionAnalyticsRecord,
};

use crate::error::StoreError;

/// Curated question/answer entries.
pub trait QuestionStore: Send + Sync {
    /// All entries in insertion order.
    fn all(&self) -> Result<Vec<QaEntry>, StoreError>;

    /// Entries whose category equals `category` exactly. Empty when none match.
    fn by_category(&self, category: &str) -> Result<Vec<QaEntry>, StoreError>;

    /// A single entry by id.
    fn get(&self, id: u64) -> Result<QaEntry, StoreError>;

    /// Assign the next id, append, and return the stored copy.
    fn create(&self, entry: NewQaEntry) -> Result<QaEntry, StoreError>;
}

/// Informational notices, read-only to the pipeline.
pub trait NotificationStore: Send + Sync {
    fn all_notifications(&self) -> Result<Vec<Notification>, StoreError>;

    fn create_notification(&self, notification: NewNotification)
        -> Result<Notification, StoreError>;
}

/// Per-question ask counts.
pub trait AnalyticsStore: Send + Sync {
    /// Count one ask of `question`.
    ///
    /// Questions are compared case-insensitively against previously tracked
    /// text; a repeat increments `count` and refreshes `last_asked`.
    fn track(&self, question: &str, category: &str) -> Result<(), StoreError>;

    /// Every record in creation order.
    fn all_records(&self) -> Result<Vec<QuestionAnalyticsRecord>, StoreError>;

    /// Records by descending count, ties in creation order, at most `limit`.
    fn top_questions(&self, limit: usize) -> Result<Vec<QuestionAnalyticsRecord>, StoreError> {
        Ok(rank_top(self.all_records()?, limit))
    }

    /// Summed counts per category, sorted by category name.
    fn category_totals(&self) -> Result<Vec<CategoryTotal>, StoreError> {
        let mut totals: BTreeMap<String, u64> = BTreeMap::new();
        for record in self.all_records()? {
            *totals.entry(record.category).or_insert(0) += record.count;
        }
        Ok(totals
            .into_iter()
            .map(|(category, count)| CategoryTotal { category, count })
            .collect())
    }
}

/// Sort records by count descending and keep the first `limit`.
///
/// The sort is stable, so records with equal counts keep the order they
/// arrived in (creation order for every backend here).
pub fn rank_top(
    mut records: Vec<QuestionAnalyticsRecord>,
    limit: usize,
) -> Vec<QuestionAnalyticsRecord> {
    if limit == 0 {
        return Vec::new();
    }
    records.sort_by(|a, b| b.count.cmp(&a.count));
    records.truncate(limit);
    records
}

/// Case-insensitive key for an analytics question.
pub(crate) fn question_key(question: &str) -> String {
    question.to_lowercase()
}

/// Reject entries with blank fields.
pub(crate) fn validate_new_entry(entry: &NewQaEntry) -> Result<(), StoreError> {
    if entry.question.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "question must not be empty".to_string(),
        ));
    }
    if entry.answer.trim().is_empty() {
        return Err(StoreError::InvalidInput("answer must not be empty".to_string()));
    }
    if entry.category.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "category must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_new_notification(n: &NewNotification) -> Result<(), StoreError> {
    if n.title.trim().is_empty() {
        return Err(StoreError::InvalidInput("title must not be empty".to_string()));
    }
    if n.title.chars().count() > 100 {
        return Err(StoreError::InvalidInput(
            "title must be at most 100 characters".to_string(),
        ));
    }
    if n.content.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "content must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_track(question: &str) -> Result<(), StoreError> {
    if question.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "question must not be empty".to_string(),
        ));
    }
    Ok(())
}
