//! SQLite record store.
//!
//! One repository per record kind, raw SQL with rusqlite, no ORM. Schema is
//! created idempotently on open; every caller goes through [`open`] and gets
//! a migrated connection.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub mod action_items;
pub mod meetings;
pub mod summaries;
pub mod transcripts;

/// Open (and migrate) the database at an explicit path.
pub fn open(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(db_path).context("Failed to open database connection")?;

    conn.execute_batch("PRAGMA foreign_keys = ON")
        .context("Failed to enable foreign keys")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meetings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            audio_url TEXT,
            audio_filename TEXT,
            duration_seconds INTEGER,
            status TEXT NOT NULL DEFAULT 'uploaded',
            error TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create meetings table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meetings_created_at ON meetings(created_at DESC)",
        [],
    )
    .context("Failed to create meetings created_at index")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meetings_status ON meetings(status)",
        [],
    )
    .context("Failed to create meetings status index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transcripts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meeting_id INTEGER NOT NULL REFERENCES meetings(id),
            full_text TEXT NOT NULL,
            language TEXT NOT NULL DEFAULT 'en',
            confidence_score REAL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create transcripts table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transcripts_meeting_id ON transcripts(meeting_id)",
        [],
    )
    .context("Failed to create transcripts meeting_id index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS summaries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meeting_id INTEGER NOT NULL REFERENCES meetings(id),
            summary_text TEXT NOT NULL,
            key_decisions TEXT NOT NULL DEFAULT '[]',
            participants TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create summaries table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_summaries_meeting_id ON summaries(meeting_id)",
        [],
    )
    .context("Failed to create summaries meeting_id index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS action_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meeting_id INTEGER NOT NULL REFERENCES meetings(id),
            task_description TEXT NOT NULL,
            assignee TEXT,
            due_date TEXT,
            priority TEXT NOT NULL DEFAULT 'medium',
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create action_items table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_action_items_meeting_id ON action_items(meeting_id)",
        [],
    )
    .context("Failed to create action_items meeting_id index")?;

    Ok(())
}
