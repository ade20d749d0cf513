//! Read-only aggregation of a meeting and everything derived from it.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::action_items::{ActionItemRecord, ActionItemRepository};
use crate::db::meetings::{MeetingRecord, MeetingRepository};
use crate::db::summaries::{SummaryRecord, SummaryRepository};
use crate::db::transcripts::{TranscriptRecord, TranscriptRepository};

/// Full view of a meeting: the record plus the latest transcript, the latest
/// summary, and all action items.
#[derive(Debug, Serialize)]
pub struct MeetingDetails {
    pub meeting: MeetingRecord,
    pub transcript: Option<TranscriptRecord>,
    pub summary: Option<SummaryRecord>,
    pub action_items: Vec<ActionItemRecord>,
}

/// Assemble the detail view. Returns `None` when the meeting itself does
/// not exist; the derived records are each optional on their own.
pub fn assemble(conn: &Connection, meeting_id: i64) -> Result<Option<MeetingDetails>> {
    let Some(meeting) = MeetingRepository::get(conn, meeting_id)? else {
        return Ok(None);
    };

    let transcript = TranscriptRepository::latest_for_meeting(conn, meeting_id)?;
    let summary = SummaryRepository::latest_for_meeting(conn, meeting_id)?;
    let action_items = ActionItemRepository::list_for_meeting(conn, meeting_id)?;

    Ok(Some(MeetingDetails {
        meeting,
        transcript,
        summary,
        action_items,
    }))
}
