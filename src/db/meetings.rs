//! Meeting record persistence.
//!
//! CRUD over the `meetings` table. The status column only ever holds one of
//! the six [`MeetingStatus`] strings; every write goes through the typed
//! enum, and reads fail loudly on anything else.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::meeting::status::MeetingStatus;

/// A meeting record from the database.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingRecord {
    pub id: i64,
    pub title: String,
    pub audio_url: Option<String>,
    pub audio_filename: Option<String>,
    pub duration_seconds: Option<i64>,
    pub status: MeetingStatus,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

const COLUMNS: &str = "id, title, audio_url, audio_filename, duration_seconds, \
                       status, error, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<MeetingRecord> {
    let status_str: String = row.get(5)?;
    let status =
        MeetingStatus::parse(&status_str).map_err(|_| rusqlite::Error::InvalidQuery)?;

    Ok(MeetingRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        audio_url: row.get(2)?,
        audio_filename: row.get(3)?,
        duration_seconds: row.get(4)?,
        status,
        error: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Repository for meeting records.
pub struct MeetingRepository;

impl MeetingRepository {
    /// Insert a new meeting (status = uploaded). Returns the new meeting ID.
    pub fn insert(
        conn: &Connection,
        title: &str,
        audio_url: &str,
        audio_filename: &str,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO meetings (title, audio_url, audio_filename, status) \
             VALUES (?1, ?2, ?3, ?4)",
            params![title, audio_url, audio_filename, MeetingStatus::Uploaded.as_str()],
        )
        .context("Failed to insert meeting")?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a meeting by ID.
    pub fn get(conn: &Connection, id: i64) -> Result<Option<MeetingRecord>> {
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM meetings WHERE id = ?1", COLUMNS))
            .context("Failed to prepare meeting query")?;

        let mut rows = stmt
            .query_map(params![id], from_row)
            .context("Failed to query meeting")?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// List meetings, newest first.
    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<MeetingRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM meetings ORDER BY created_at DESC, id DESC LIMIT ?1",
                COLUMNS
            ))
            .context("Failed to prepare meetings list query")?;

        let rows = stmt
            .query_map(params![limit as i64], from_row)
            .context("Failed to list meetings")?;

        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?);
        }

        Ok(meetings)
    }

    /// Update the meeting status.
    pub fn update_status(conn: &Connection, id: i64, status: MeetingStatus) -> Result<()> {
        conn.execute(
            "UPDATE meetings SET status = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![status.as_str(), id],
        )
        .context("Failed to update meeting status")?;
        Ok(())
    }

    /// Mark transcription done: status = transcribed, duration recorded.
    pub fn set_transcribed(conn: &Connection, id: i64, duration_seconds: i64) -> Result<()> {
        conn.execute(
            "UPDATE meetings SET status = ?1, duration_seconds = ?2, \
             updated_at = CURRENT_TIMESTAMP WHERE id = ?3",
            params![MeetingStatus::Transcribed.as_str(), duration_seconds, id],
        )
        .context("Failed to mark meeting transcribed")?;
        Ok(())
    }

    /// Mark the meeting as failed with a descriptive error.
    pub fn fail(conn: &Connection, id: i64, error: &str) -> Result<()> {
        conn.execute(
            "UPDATE meetings SET status = ?1, error = ?2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?3",
            params![MeetingStatus::Failed.as_str(), error, id],
        )
        .context("Failed to mark meeting as failed")?;
        Ok(())
    }
}
