//! Transcript persistence.
//!
//! Transcripts are written once by the transcription stage and never
//! updated. Retrieval takes the most recent row for a meeting; the pipeline
//! only ever creates one, but the contract tolerates multiples.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptRecord {
    pub id: i64,
    pub meeting_id: i64,
    pub full_text: String,
    pub language: String,
    pub confidence_score: Option<f64>,
    pub created_at: String,
}

const COLUMNS: &str = "id, meeting_id, full_text, language, confidence_score, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<TranscriptRecord> {
    Ok(TranscriptRecord {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        full_text: row.get(2)?,
        language: row.get(3)?,
        confidence_score: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub struct TranscriptRepository;

impl TranscriptRepository {
    /// Insert a transcript and return the stored record.
    pub fn insert(
        conn: &Connection,
        meeting_id: i64,
        full_text: &str,
        language: &str,
        confidence_score: Option<f64>,
    ) -> Result<TranscriptRecord> {
        conn.execute(
            "INSERT INTO transcripts (meeting_id, full_text, language, confidence_score) \
             VALUES (?1, ?2, ?3, ?4)",
            params![meeting_id, full_text, language, confidence_score],
        )
        .context("Failed to insert transcript")?;

        let id = conn.last_insert_rowid();
        Self::get(conn, id)?.context("Transcript vanished after insert")
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<TranscriptRecord>> {
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM transcripts WHERE id = ?1", COLUMNS))
            .context("Failed to prepare transcript query")?;

        let mut rows = stmt
            .query_map(params![id], from_row)
            .context("Failed to query transcript")?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Most recent transcript for a meeting, if any.
    pub fn latest_for_meeting(
        conn: &Connection,
        meeting_id: i64,
    ) -> Result<Option<TranscriptRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM transcripts WHERE meeting_id = ?1 \
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                COLUMNS
            ))
            .context("Failed to prepare latest transcript query")?;

        let mut rows = stmt
            .query_map(params![meeting_id], from_row)
            .context("Failed to query latest transcript")?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::meetings::MeetingRepository;
    use crate::db::migrate;

    fn setup_db_with_meeting() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let id = MeetingRepository::insert(&conn, "Test", "/tmp/test.mp3", "test.mp3").unwrap();
        (conn, id)
    }

    #[test]
    fn test_insert_returns_record() {
        let (conn, meeting_id) = setup_db_with_meeting();

        let transcript = TranscriptRepository::insert(
            &conn,
            meeting_id,
            "Hello everyone, let's get started.",
            "en",
            Some(0.92),
        )
        .unwrap();

        assert!(transcript.id > 0);
        assert_eq!(transcript.meeting_id, meeting_id);
        assert_eq!(transcript.full_text, "Hello everyone, let's get started.");
        assert_eq!(transcript.language, "en");
        assert_eq!(transcript.confidence_score, Some(0.92));
    }

    #[test]
    fn test_latest_for_meeting_none() {
        let (conn, meeting_id) = setup_db_with_meeting();
        let latest = TranscriptRepository::latest_for_meeting(&conn, meeting_id).unwrap();
        assert!(latest.is_none());
    }

    #[test]
    fn test_latest_for_meeting_picks_most_recent() {
        let (conn, meeting_id) = setup_db_with_meeting();

        TranscriptRepository::insert(&conn, meeting_id, "first pass", "en", None).unwrap();
        TranscriptRepository::insert(&conn, meeting_id, "second pass", "en", None).unwrap();

        let latest = TranscriptRepository::latest_for_meeting(&conn, meeting_id)
            .unwrap()
            .unwrap();
        assert_eq!(latest.full_text, "second pass");
    }

    #[test]
    fn test_latest_scoped_to_meeting() {
        let (conn, meeting_id) = setup_db_with_meeting();
        let other =
            MeetingRepository::insert(&conn, "Other", "/tmp/other.mp3", "other.mp3").unwrap();

        TranscriptRepository::insert(&conn, other, "other meeting text", "en", None).unwrap();

        let latest = TranscriptRepository::latest_for_meeting(&conn, meeting_id).unwrap();
        assert!(latest.is_none());
    }
}
