//! Summarization stage: transcribed → summarizing → completed | failed.
//!
//! Same idempotency contract as transcription: an existing summary
//! short-circuits the stage. Action-item persistence is best-effort — a
//! summary with partial (or zero) action items is acceptable.

use anyhow::Context;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::analysis::TextAnalysis;
use crate::db::{
    self,
    action_items::{ActionItemRecord, ActionItemRepository},
    meetings::MeetingRepository,
    summaries::{SummaryRecord, SummaryRepository},
    transcripts::TranscriptRepository,
};

use super::error::{StageError, StageResult};
use super::status::MeetingStatus;

/// Result of a summarization stage invocation.
#[derive(Debug)]
pub struct SummarizationOutcome {
    pub summary: SummaryRecord,
    pub action_items: Vec<ActionItemRecord>,
    /// True when the call short-circuited on an existing summary.
    pub already_existed: bool,
}

pub struct SummarizationStage {
    db_path: PathBuf,
    analysis: Box<dyn TextAnalysis>,
}

impl SummarizationStage {
    pub fn new(db_path: PathBuf, analysis: Box<dyn TextAnalysis>) -> Self {
        Self { db_path, analysis }
    }

    /// Run the stage for one meeting.
    pub async fn run(&self, meeting_id: i64) -> StageResult<SummarizationOutcome> {
        if !self.analysis.is_configured() {
            return Err(StageError::Unconfigured(
                "Analysis API key is not configured. Set GROQ_API_KEY or \
                 [analysis].api_key in the config file."
                    .to_string(),
            ));
        }

        let transcript_text = {
            let conn = db::open(&self.db_path)?;

            let transcript = TranscriptRepository::latest_for_meeting(&conn, meeting_id)?
                .ok_or_else(|| {
                    StageError::NotFound(
                        "Transcript not found. The transcription may still be in progress \
                         or may have failed. Please wait a moment and try again."
                            .to_string(),
                    )
                })?;

            if let Some(existing) = SummaryRepository::latest_for_meeting(&conn, meeting_id)? {
                info!(
                    "Meeting {} already has summary {}, skipping analysis",
                    meeting_id, existing.id
                );
                let action_items = ActionItemRepository::list_for_meeting(&conn, meeting_id)?;
                return Ok(SummarizationOutcome {
                    summary: existing,
                    action_items,
                    already_existed: true,
                });
            }

            MeetingRepository::update_status(&conn, meeting_id, MeetingStatus::Summarizing)?;

            transcript.full_text
        };

        info!("Meeting {} summarization started", meeting_id);

        let analysis = match self.analysis.analyze(&transcript_text).await {
            Ok(analysis) => analysis,
            Err(e) => {
                let e = e.context("Analysis service call failed");
                return Err(self.fail(meeting_id, e));
            }
        };

        let conn = db::open(&self.db_path)?;

        let summary = match SummaryRepository::insert(
            &conn,
            meeting_id,
            &analysis.summary,
            &analysis.key_decisions,
            &analysis.participants,
        ) {
            Ok(summary) => summary,
            Err(e) => {
                let e = e.context("Failed to save summary");
                return Err(self.fail(meeting_id, e));
            }
        };

        // Partial success is fine here: log and move on
        for item in &analysis.action_items {
            if let Err(e) = ActionItemRepository::insert(
                &conn,
                meeting_id,
                &item.task,
                item.assignee.as_deref(),
                item.due_date.as_deref(),
                item.priority,
            ) {
                warn!(
                    "Failed to save action item for meeting {}: {}",
                    meeting_id, e
                );
            }
        }

        if let Err(e) = MeetingRepository::update_status(&conn, meeting_id, MeetingStatus::Completed)
        {
            let e = e.context("Failed to update meeting status");
            return Err(self.fail(meeting_id, e));
        }

        let action_items = ActionItemRepository::list_for_meeting(&conn, meeting_id)
            .context("Failed to load saved action items")?;

        info!(
            "Meeting {} summarized: {} decisions, {} action items",
            meeting_id,
            summary.key_decisions.len(),
            action_items.len()
        );

        Ok(SummarizationOutcome {
            summary,
            action_items,
            already_existed: false,
        })
    }

    /// Record the failure on the meeting and hand the error back.
    fn fail(&self, meeting_id: i64, e: anyhow::Error) -> StageError {
        self.mark_failed(meeting_id, &e.to_string());
        StageError::Failed(e)
    }

    fn mark_failed(&self, meeting_id: i64, message: &str) {
        error!("Meeting {} summarization failed: {}", meeting_id, message);
        if let Ok(conn) = db::open(&self.db_path) {
            let _ = MeetingRepository::fail(&conn, meeting_id, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ActionItemDraft, MeetingAnalysis};
    use crate::db::action_items::{ItemPriority, ItemStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FakeAnalysis {
        calls: Arc<AtomicUsize>,
        fails: bool,
    }

    #[async_trait]
    impl TextAnalysis for FakeAnalysis {
        async fn analyze(&self, _transcript: &str) -> anyhow::Result<MeetingAnalysis> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fails {
                anyhow::bail!("model unavailable");
            }
            Ok(MeetingAnalysis {
                summary: "The team agreed to ship on Friday.".to_string(),
                key_decisions: vec!["Ship on Friday".to_string()],
                participants: vec!["Alice".to_string(), "Bob".to_string()],
                action_items: vec![
                    ActionItemDraft {
                        task: "Update the changelog".to_string(),
                        assignee: Some("Alice".to_string()),
                        priority: ItemPriority::High,
                        due_date: Some("2026-08-07".to_string()),
                    },
                    ActionItemDraft {
                        task: "Book the retro".to_string(),
                        assignee: None,
                        priority: ItemPriority::Medium,
                        due_date: None,
                    },
                ],
            })
        }

        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    struct Fixture {
        _dir: TempDir,
        db_path: PathBuf,
        calls: Arc<AtomicUsize>,
    }

    fn setup(fails: bool) -> (Fixture, SummarizationStage) {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");
        let calls = Arc::new(AtomicUsize::new(0));

        let stage = SummarizationStage::new(
            db_path.clone(),
            Box::new(FakeAnalysis {
                calls: calls.clone(),
                fails,
            }),
        );

        (
            Fixture {
                _dir: dir,
                db_path,
                calls,
            },
            stage,
        )
    }

    fn insert_transcribed_meeting(fixture: &Fixture) -> i64 {
        let conn = db::open(&fixture.db_path).unwrap();
        let id =
            MeetingRepository::insert(&conn, "Standup", "/tmp/standup.mp3", "standup.mp3")
                .unwrap();
        TranscriptRepository::insert(&conn, id, "Alice: let's ship Friday.", "en", None).unwrap();
        MeetingRepository::set_transcribed(&conn, id, 120).unwrap();
        id
    }

    fn meeting_status(fixture: &Fixture, id: i64) -> MeetingStatus {
        let conn = db::open(&fixture.db_path).unwrap();
        MeetingRepository::get(&conn, id).unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_success_transitions_to_completed() {
        let (fixture, stage) = setup(false);
        let id = insert_transcribed_meeting(&fixture);

        let outcome = stage.run(id).await.unwrap();

        assert!(!outcome.already_existed);
        assert!(!outcome.summary.summary_text.is_empty());
        assert_eq!(outcome.summary.key_decisions, vec!["Ship on Friday"]);
        assert_eq!(outcome.action_items.len(), 2);
        for item in &outcome.action_items {
            assert_eq!(item.status, ItemStatus::Pending);
        }
        assert_eq!(meeting_status(&fixture, id), MeetingStatus::Completed);
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let (fixture, stage) = setup(false);
        let id = insert_transcribed_meeting(&fixture);

        let first = stage.run(id).await.unwrap();
        let second = stage.run(id).await.unwrap();

        assert!(second.already_existed);
        assert_eq!(second.summary.id, first.summary.id);
        assert_eq!(second.action_items.len(), first.action_items.len());
        // The analysis service was only called once
        assert_eq!(fixture.calls.load(Ordering::SeqCst), 1);

        let conn = db::open(&fixture.db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM summaries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_no_transcript_leaves_status_untouched() {
        let (fixture, stage) = setup(false);

        let conn = db::open(&fixture.db_path).unwrap();
        let id =
            MeetingRepository::insert(&conn, "Fresh", "/tmp/fresh.mp3", "fresh.mp3").unwrap();
        drop(conn);

        let err = stage.run(id).await.unwrap_err();
        assert!(matches!(err, StageError::NotFound(_)));
        assert_eq!(meeting_status(&fixture, id), MeetingStatus::Uploaded);
        assert_eq!(fixture.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analysis_failure_marks_meeting_failed() {
        let (fixture, stage) = setup(true);
        let id = insert_transcribed_meeting(&fixture);

        let err = stage.run(id).await.unwrap_err();
        assert!(matches!(err, StageError::Failed(_)));
        assert_eq!(meeting_status(&fixture, id), MeetingStatus::Failed);

        let conn = db::open(&fixture.db_path).unwrap();
        let meeting = MeetingRepository::get(&conn, id).unwrap().unwrap();
        assert!(meeting.error.unwrap().contains("Analysis service call failed"));
        assert!(SummaryRepository::latest_for_meeting(&conn, id)
            .unwrap()
            .is_none());
    }
}
