//! Summary persistence.
//!
//! The key-decision and participant lists are stored as JSON arrays in TEXT
//! columns, same approach as the rest of the store: raw SQL, serde_json for
//! the structured bits.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord {
    pub id: i64,
    pub meeting_id: i64,
    pub summary_text: String,
    pub key_decisions: Vec<String>,
    pub participants: Vec<String>,
    pub created_at: String,
}

const COLUMNS: &str = "id, meeting_id, summary_text, key_decisions, participants, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<SummaryRecord> {
    let decisions_json: String = row.get(3)?;
    let participants_json: String = row.get(4)?;

    let key_decisions: Vec<String> =
        serde_json::from_str(&decisions_json).map_err(|_| rusqlite::Error::InvalidQuery)?;
    let participants: Vec<String> =
        serde_json::from_str(&participants_json).map_err(|_| rusqlite::Error::InvalidQuery)?;

    Ok(SummaryRecord {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        summary_text: row.get(2)?,
        key_decisions,
        participants,
        created_at: row.get(5)?,
    })
}

pub struct SummaryRepository;

impl SummaryRepository {
    /// Insert a summary and return the stored record.
    pub fn insert(
        conn: &Connection,
        meeting_id: i64,
        summary_text: &str,
        key_decisions: &[String],
        participants: &[String],
    ) -> Result<SummaryRecord> {
        let decisions_json =
            serde_json::to_string(key_decisions).context("Failed to serialize key decisions")?;
        let participants_json =
            serde_json::to_string(participants).context("Failed to serialize participants")?;

        conn.execute(
            "INSERT INTO summaries (meeting_id, summary_text, key_decisions, participants) \
             VALUES (?1, ?2, ?3, ?4)",
            params![meeting_id, summary_text, decisions_json, participants_json],
        )
        .context("Failed to insert summary")?;

        let id = conn.last_insert_rowid();
        Self::get(conn, id)?.context("Summary vanished after insert")
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<SummaryRecord>> {
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM summaries WHERE id = ?1", COLUMNS))
            .context("Failed to prepare summary query")?;

        let mut rows = stmt
            .query_map(params![id], from_row)
            .context("Failed to query summary")?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Most recent summary for a meeting, if any.
    pub fn latest_for_meeting(
        conn: &Connection,
        meeting_id: i64,
    ) -> Result<Option<SummaryRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM summaries WHERE meeting_id = ?1 \
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                COLUMNS
            ))
            .context("Failed to prepare latest summary query")?;

        let mut rows = stmt
            .query_map(params![meeting_id], from_row)
            .context("Failed to query latest summary")?;

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
    fn test_insert_round_trips_lists() {
        let (conn, meeting_id) = setup_db_with_meeting();

        let summary = SummaryRepository::insert(
            &conn,
            meeting_id,
            "The team agreed to ship on Friday.",
            &["Ship on Friday".to_string()],
            &["Alice".to_string(), "Bob".to_string()],
        )
        .unwrap();

        assert_eq!(summary.summary_text, "The team agreed to ship on Friday.");
        assert_eq!(summary.key_decisions, vec!["Ship on Friday"]);
        assert_eq!(summary.participants, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_insert_empty_lists() {
        let (conn, meeting_id) = setup_db_with_meeting();

        let summary =
            SummaryRepository::insert(&conn, meeting_id, "Short sync.", &[], &[]).unwrap();

        assert!(summary.key_decisions.is_empty());
        assert!(summary.participants.is_empty());
    }

    #[test]
    fn test_latest_for_meeting() {
        let (conn, meeting_id) = setup_db_with_meeting();

        assert!(SummaryRepository::latest_for_meeting(&conn, meeting_id)
            .unwrap()
            .is_none());

        SummaryRepository::insert(&conn, meeting_id, "first", &[], &[]).unwrap();
        SummaryRepository::insert(&conn, meeting_id, "second", &[], &[]).unwrap();

        let latest = SummaryRepository::latest_for_meeting(&conn, meeting_id)
            .unwrap()
            .unwrap();
        assert_eq!(latest.summary_text, "second");
    }
}
