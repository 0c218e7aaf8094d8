//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| StoreError::Unavailable(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| {
            StoreError::Unavailable(format!("Failed to query migration version: {}", e))
        })?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Q&A, notifications, question analytics.
///
/// AUTOINCREMENT keeps ids from being reused after deletes made outside
/// the service.
fn apply_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS qa_entries (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            question    TEXT NOT NULL,
            answer      TEXT NOT NULL,
            category    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_qa_entries_category ON qa_entries(category);

        CREATE TABLE IF NOT EXISTS notifications (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            priority    TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high')),
            date_ms     INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS question_analytics (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            question_key  TEXT NOT NULL UNIQUE,
            question      TEXT NOT NULL,
            category      TEXT NOT NULL,
            count         INTEGER NOT NULL DEFAULT 1 CHECK (count >= 1),
            last_asked_ms INTEGER NOT NULL
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| StoreError::Unavailable(format!("Failed to apply migration v1: {}", e)))?;
    Ok(())
}
