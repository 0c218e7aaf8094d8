//! In-memory question analytics counter.
//!
//! Records live in creation order behind a single `RwLock`; a side index
//! maps the lower-cased question to its slot so repeats update in place.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use f1desk_core::types::QuestionAnalyticsRecord;

use crate::error::StoreError;
use crate::store::{question_key, validate_track, AnalyticsStore};

#[derive(Default)]
struct CounterInner {
    records: Vec<QuestionAnalyticsRecord>,
    index: HashMap<String, usize>,
    next_id: u64,
}

/// Thread-safe ask counter keyed by case-insensitive question text.
#[derive(Default)]
pub struct AnalyticsCounter {
    inner: RwLock<CounterInner>,
}

impl AnalyticsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct questions tracked.
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalyticsStore for AnalyticsCounter {
    fn track(&self, question: &str, category: &str) -> Result<(), StoreError> {
        validate_track(question)?;

        let mut guard = self
            .inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("analytics lock poisoned: {}", e)))?;
        let inner = &mut *guard;
        let key = question_key(question);
        let now = Utc::now();

        if let Some(&slot) = inner.index.get(&key) {
            let record = &mut inner.records[slot];
            record.count += 1;
            record.last_asked = now;
            tracing::debug!(question = %record.question, count = record.count, "Question count incremented");
            return Ok(());
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let slot = inner.records.len();
        inner.records.push(QuestionAnalyticsRecord {
            id,
            question: question.to_string(),
            category: category.to_string(),
            count: 1,
            last_asked: now,
        });
        inner.index.insert(key, slot);
        tracing::debug!(question = %question, category = %category, "Question tracked");
        Ok(())
    }

    fn all_records(&self) -> Result<Vec<QuestionAnalyticsRecord>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("analytics lock poisoned: {}", e)))?;
        Ok(inner.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_creates_record() {
        let counter = AnalyticsCounter::new();
        counter.track("What is OPT?", "work").unwrap();

        let records = counter.all_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question, "What is OPT?");
        assert_eq!(records[0].category, "work");
        assert_eq!(records[0].count, 1);
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn test_track_case_different_repeats_increment() {
        let counter = AnalyticsCounter::new();
        counter.track("What is OPT?", "work").unwrap();
        let first_seen = counter.all_records().unwrap()[0].last_asked;
        counter.track("WHAT IS opt?", "work").unwrap();

        let records = counter.all_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 2);
        assert_eq!(records[0].question, "What is OPT?");
        assert!(records[0].last_asked >= first_seen);
    }

    #[test]
    fn test_track_keeps_first_category() {
        let counter = AnalyticsCounter::new();
        counter.track("travel rules", "travel").unwrap();
        counter.track("Travel Rules", "academic").unwrap();
        assert_eq!(counter.all_records().unwrap()[0].category, "travel");
    }

    #[test]
    fn test_track_distinct_questions() {
        let counter = AnalyticsCounter::new();
        counter.track("a question", "work").unwrap();
        counter.track("another question", "academic").unwrap();
        let records = counter.all_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, 2);
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn test_track_rejects_blank_question() {
        let counter = AnalyticsCounter::new();
        assert!(matches!(
            counter.track("   ", "work"),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(counter.is_empty());
    }

    fn track_n(counter: &AnalyticsCounter, question: &str, n: usize) {
        for _ in 0..n {
            counter.track(question, "work").unwrap();
        }
    }

    #[test]
    fn test_top_questions_counts_5_3_3_1() {
        let counter = AnalyticsCounter::new();
        track_n(&counter, "three first", 3);
        track_n(&counter, "five", 5);
        track_n(&counter, "one", 1);
        track_n(&counter, "three second", 3);

        let top = counter.top_questions(2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].count, 5);
        assert_eq!(top[1].count, 3);
        // Ties resolve in creation order.
        assert_eq!(top[1].question, "three first");
        assert!(top.iter().all(|r| r.count != 1));
    }

    #[test]
    fn test_top_questions_zero_limit() {
        let counter = AnalyticsCounter::new();
        track_n(&counter, "q", 2);
        assert!(counter.top_questions(0).unwrap().is_empty());
    }

    #[test]
    fn test_top_questions_empty_counter() {
        let counter = AnalyticsCounter::new();
        assert!(counter.top_questions(10).unwrap().is_empty());
    }

    #[test]
    fn test_category_totals() {
        let counter = AnalyticsCounter::new();
        counter.track("q1", "work").unwrap();
        counter.track("q1", "work").unwrap();
        counter.track("q2", "work").unwrap();
        counter.track("q3", "academic").unwrap();

        let totals = counter.category_totals().unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, "academic");
        assert_eq!(totals[0].count, 1);
        assert_eq!(totals[1].category, "work");
        assert_eq!(totals[1].count, 3);
    }

    #[test]
    fn test_concurrent_tracking_serializes_writes() {
        use std::sync::Arc;
        use std::thread;

        let counter = Arc::new(AnalyticsCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..25 {
                        let q = if i % 2 == 0 { "Shared Question" } else { "shared question" };
                        counter.track(q, "work").unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let records = counter.all_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 200);
    }
}
