//! Transcription stage: uploaded → transcribing → transcribed | failed.
//!
//! Invoking the stage when a transcript already exists is a no-op returning
//! the existing transcript — duplicate triggers from the polling client are
//! expected and must not re-call the external service.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::db::{
    self,
    meetings::MeetingRepository,
    transcripts::{TranscriptRecord, TranscriptRepository},
};
use crate::storage::AudioStore;
use crate::transcription::{AudioPayload, SpeechToText, TranscriptionError};

use super::error::{StageError, StageResult};
use super::status::MeetingStatus;

/// Result of a transcription stage invocation.
#[derive(Debug)]
pub struct TranscriptionOutcome {
    pub transcript: TranscriptRecord,
    pub duration_seconds: i64,
    /// True when the call short-circuited on an existing transcript.
    pub already_existed: bool,
}

pub struct TranscriptionStage {
    db_path: PathBuf,
    store: AudioStore,
    speech_to_text: Box<dyn SpeechToText>,
    language: String,
}

impl TranscriptionStage {
    pub fn new(
        db_path: PathBuf,
        store: AudioStore,
        speech_to_text: Box<dyn SpeechToText>,
        language: String,
    ) -> Self {
        Self {
            db_path,
            store,
            speech_to_text,
            language,
        }
    }

    /// Run the stage for one meeting.
    pub async fn run(&self, meeting_id: i64) -> StageResult<TranscriptionOutcome> {
        if !self.speech_to_text.is_configured() {
            return Err(StageError::Unconfigured(
                "Transcription API key is not configured. Set GROQ_API_KEY or \
                 [transcription].api_key in the config file."
                    .to_string(),
            ));
        }

        // Preconditions and the idempotency short-circuit, one connection.
        let (audio_url, audio_filename) = {
            let conn = db::open(&self.db_path)?;

            let meeting = MeetingRepository::get(&conn, meeting_id)?
                .ok_or_else(|| StageError::NotFound("Meeting not found".to_string()))?;

            if let Some(existing) = TranscriptRepository::latest_for_meeting(&conn, meeting_id)? {
                info!(
                    "Meeting {} already has transcript {}, skipping transcription",
                    meeting_id, existing.id
                );
                return Ok(TranscriptionOutcome {
                    transcript: existing,
                    duration_seconds: meeting.duration_seconds.unwrap_or(0),
                    already_existed: true,
                });
            }

            let audio_url = meeting
                .audio_url
                .filter(|url| !url.is_empty())
                .ok_or_else(|| {
                    StageError::InvalidInput(
                        "No audio file found for this meeting".to_string(),
                    )
                })?;

            MeetingRepository::update_status(&conn, meeting_id, MeetingStatus::Transcribing)?;

            let filename = meeting
                .audio_filename
                .unwrap_or_else(|| "audio.mp3".to_string());

            (audio_url, filename)
        };

        info!("Meeting {} transcription started", meeting_id);

        let audio_bytes = match self.store.fetch(&audio_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let e = e.context("Failed to download audio file");
                return Err(self.fail(meeting_id, e));
            }
        };

        let payload = AudioPayload {
            bytes: &audio_bytes,
            filename: &audio_filename,
            media_type: media_type_for(&audio_filename),
        };

        let output = match self.speech_to_text.transcribe(payload, &self.language).await {
            Ok(output) => output,
            Err(TranscriptionError::RateLimited {
                message,
                retry_after,
            }) => {
                self.mark_failed(meeting_id, &message);
                return Err(StageError::RateLimited {
                    message,
                    retry_after,
                });
            }
            Err(TranscriptionError::Other(e)) => {
                let e = e.context("Transcription service call failed");
                return Err(self.fail(meeting_id, e));
            }
        };

        let duration_seconds = output.duration.unwrap_or(0.0).round() as i64;
        let language = output
            .language
            .unwrap_or_else(|| self.language.clone());

        let conn = db::open(&self.db_path)?;
        let transcript = match TranscriptRepository::insert(
            &conn,
            meeting_id,
            &output.text,
            &language,
            None,
        ) {
            Ok(transcript) => transcript,
            Err(e) => {
                let e = e.context("Failed to save transcript");
                return Err(self.fail(meeting_id, e));
            }
        };

        if let Err(e) = MeetingRepository::set_transcribed(&conn, meeting_id, duration_seconds) {
            let e = e.context("Failed to update meeting status");
            return Err(self.fail(meeting_id, e));
        }

        info!(
            "Meeting {} transcribed: {} chars, {}s of audio",
            meeting_id,
            transcript.full_text.len(),
            duration_seconds
        );

        Ok(TranscriptionOutcome {
            transcript,
            duration_seconds,
            already_existed: false,
        })
    }

    /// Record the failure on the meeting and hand the error back.
    fn fail(&self, meeting_id: i64, e: anyhow::Error) -> StageError {
        self.mark_failed(meeting_id, &e.to_string());
        StageError::Failed(e)
    }

    fn mark_failed(&self, meeting_id: i64, message: &str) {
        error!("Meeting {} transcription failed: {}", meeting_id, message);
        if let Ok(conn) = db::open(&self.db_path) {
            let _ = MeetingRepository::fail(&conn, meeting_id, message);
        }
    }
}

/// Map a stored filename to the media type sent to the transcription
/// service.
fn media_type_for(filename: &str) -> &'static str {
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("mp4") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("webm") => "audio/webm",
        Some("ogg") => "audio/ogg",
        Some("opus") => "audio/opus",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptionOutput;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Scripted speech-to-text double that counts external calls.
    struct FakeSpeechToText {
        calls: Arc<AtomicUsize>,
        response: Result<TranscriptionOutput, &'static str>,
        rate_limited: bool,
        configured: bool,
    }

    impl FakeSpeechToText {
        fn succeeding(calls: Arc<AtomicUsize>) -> Self {
            Self {
                calls,
                response: Ok(TranscriptionOutput {
                    text: "Hello everyone, let's get started.".to_string(),
                    language: Some("en".to_string()),
                    duration: Some(124.6),
                }),
                rate_limited: false,
                configured: true,
            }
        }

        fn failing(calls: Arc<AtomicUsize>, message: &'static str) -> Self {
            Self {
                calls,
                response: Err(message),
                rate_limited: false,
                configured: true,
            }
        }

        fn rate_limiting(calls: Arc<AtomicUsize>) -> Self {
            Self {
                calls,
                response: Err("rate limited"),
                rate_limited: true,
                configured: true,
            }
        }
    }

    #[async_trait]
    impl SpeechToText for FakeSpeechToText {
        async fn transcribe(
            &self,
            _audio: AudioPayload<'_>,
            _language: &str,
        ) -> Result<TranscriptionOutput, TranscriptionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.rate_limited {
                return Err(TranscriptionError::RateLimited {
                    message: "Rate limit exceeded. Please wait 2m30s and try again.".to_string(),
                    retry_after: "2m30s".to_string(),
                });
            }
            match &self.response {
                Ok(output) => Ok(output.clone()),
                Err(message) => Err(anyhow::anyhow!(*message).into()),
            }
        }

        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }

    struct Fixture {
        _dir: TempDir,
        db_path: PathBuf,
        calls: Arc<AtomicUsize>,
    }

    fn setup(stt: impl FnOnce(Arc<AtomicUsize>) -> FakeSpeechToText) -> (Fixture, TranscriptionStage) {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");
        let calls = Arc::new(AtomicUsize::new(0));

        let stage = TranscriptionStage::new(
            db_path.clone(),
            AudioStore::new(dir.path().join("audio")),
            Box::new(stt(calls.clone())),
            "en".to_string(),
        );

        let fixture = Fixture {
            _dir: dir,
            db_path,
            calls,
        };
        (fixture, stage)
    }

    fn insert_meeting_with_audio(fixture: &Fixture) -> i64 {
        let audio_path = fixture.db_path.parent().unwrap().join("meeting.mp3");
        std::fs::write(&audio_path, b"fake audio").unwrap();

        let conn = db::open(&fixture.db_path).unwrap();
        MeetingRepository::insert(
            &conn,
            "Standup",
            &audio_path.to_string_lossy(),
            "meeting.mp3",
        )
        .unwrap()
    }

    fn meeting_status(fixture: &Fixture, id: i64) -> MeetingStatus {
        let conn = db::open(&fixture.db_path).unwrap();
        MeetingRepository::get(&conn, id).unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_success_transitions_to_transcribed() {
        let (fixture, stage) = setup(FakeSpeechToText::succeeding);
        let id = insert_meeting_with_audio(&fixture);

        let outcome = stage.run(id).await.unwrap();

        assert!(!outcome.already_existed);
        assert!(!outcome.transcript.full_text.is_empty());
        assert_eq!(outcome.duration_seconds, 125); // 124.6 rounded
        assert_eq!(meeting_status(&fixture, id), MeetingStatus::Transcribed);

        let conn = db::open(&fixture.db_path).unwrap();
        let meeting = MeetingRepository::get(&conn, id).unwrap().unwrap();
        assert_eq!(meeting.duration_seconds, Some(125));
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let (fixture, stage) = setup(FakeSpeechToText::succeeding);
        let id = insert_meeting_with_audio(&fixture);

        let first = stage.run(id).await.unwrap();
        let second = stage.run(id).await.unwrap();

        assert!(second.already_existed);
        assert_eq!(second.transcript.id, first.transcript.id);
        // The external service was only called once
        assert_eq!(fixture.calls.load(Ordering::SeqCst), 1);

        let conn = db::open(&fixture.db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transcripts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_missing_meeting() {
        let (fixture, stage) = setup(FakeSpeechToText::succeeding);

        let err = stage.run(9999).await.unwrap_err();
        assert!(matches!(err, StageError::NotFound(_)));
        assert_eq!(fixture.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_audio_is_invalid_input() {
        let (fixture, stage) = setup(FakeSpeechToText::succeeding);

        let conn = db::open(&fixture.db_path).unwrap();
        let id = MeetingRepository::insert(&conn, "No audio", "", "none.mp3").unwrap();
        drop(conn);

        let err = stage.run(id).await.unwrap_err();
        assert!(matches!(err, StageError::InvalidInput(_)));
        // Status untouched: the precondition failed before any transition
        assert_eq!(meeting_status(&fixture, id), MeetingStatus::Uploaded);
    }

    #[tokio::test]
    async fn test_service_failure_marks_meeting_failed() {
        let (fixture, stage) = setup(|calls| FakeSpeechToText::failing(calls, "boom"));
        let id = insert_meeting_with_audio(&fixture);

        let err = stage.run(id).await.unwrap_err();
        assert!(matches!(err, StageError::Failed(_)));
        assert_eq!(meeting_status(&fixture, id), MeetingStatus::Failed);

        let conn = db::open(&fixture.db_path).unwrap();
        let meeting = MeetingRepository::get(&conn, id).unwrap().unwrap();
        assert!(meeting.error.unwrap().contains("Transcription service call failed"));
        assert!(TranscriptRepository::latest_for_meeting(&conn, id)
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_retry_hint() {
        let (fixture, stage) = setup(FakeSpeechToText::rate_limiting);
        let id = insert_meeting_with_audio(&fixture);

        let err = stage.run(id).await.unwrap_err();
        match err {
            StageError::RateLimited { retry_after, .. } => {
                assert_eq!(retry_after, "2m30s");
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }

        assert_eq!(meeting_status(&fixture, id), MeetingStatus::Failed);

        let conn = db::open(&fixture.db_path).unwrap();
        assert!(TranscriptRepository::latest_for_meeting(&conn, id)
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_download_failure_marks_meeting_failed() {
        let (fixture, stage) = setup(FakeSpeechToText::succeeding);

        let conn = db::open(&fixture.db_path).unwrap();
        let id =
            MeetingRepository::insert(&conn, "Gone", "/nonexistent/audio.mp3", "audio.mp3")
                .unwrap();
        drop(conn);

        let err = stage.run(id).await.unwrap_err();
        assert!(matches!(err, StageError::Failed(_)));
        assert_eq!(meeting_status(&fixture, id), MeetingStatus::Failed);
        // Never reached the external service
        assert_eq!(fixture.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_media_type_for_filename() {
        assert_eq!(media_type_for("meeting.mp3"), "audio/mpeg");
        assert_eq!(media_type_for("meeting.wav"), "audio/wav");
        assert_eq!(media_type_for("meeting.m4a"), "audio/mp4");
        assert_eq!(media_type_for("meeting"), "application/octet-stream");
    }
}
