//! Audio ingest: validate an uploaded payload, store it, create the meeting.
//!
//! Rejections (bad media type, oversized payload) happen before anything is
//! written — a rejected upload leaves no blob and no meeting record behind.

use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

use crate::db::{
    self,
    meetings::{MeetingRecord, MeetingRepository},
};
use crate::storage::AudioStore;

use super::error::{StageError, StageResult};

/// Declared media types accepted for upload.
pub const ALLOWED_AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/wave",
    "audio/x-wav",
    "audio/m4a",
    "audio/mp4",
    "audio/x-m4a",
    "audio/aac",
    "audio/webm",
    "audio/ogg",
    "audio/flac",
];

/// An uploaded audio payload, as extracted from the multipart request.
#[derive(Debug)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub media_type: String,
    pub title: Option<String>,
}

pub struct AudioIngest {
    db_path: PathBuf,
    store: AudioStore,
    max_bytes: usize,
}

impl AudioIngest {
    pub fn new(db_path: PathBuf, store: AudioStore, max_bytes: usize) -> Self {
        Self {
            db_path,
            store,
            max_bytes,
        }
    }

    /// Validate and store an upload, creating the meeting in `uploaded`.
    pub fn ingest(&self, upload: AudioUpload) -> StageResult<MeetingRecord> {
        if !ALLOWED_AUDIO_TYPES.contains(&upload.media_type.as_str()) {
            return Err(StageError::InvalidInput(format!(
                "Invalid file type: {}. Please upload an audio file (MP3, WAV, M4A, AAC, etc.).",
                upload.media_type
            )));
        }

        if upload.bytes.len() > self.max_bytes {
            return Err(StageError::PayloadTooLarge(format!(
                "File too large. Maximum size is {} MB. Please compress your audio file before uploading.",
                self.max_bytes / (1024 * 1024)
            )));
        }

        if upload.bytes.is_empty() {
            return Err(StageError::InvalidInput(
                "No audio file provided".to_string(),
            ));
        }

        let stored = self
            .store
            .store(&upload.bytes, &upload.filename)
            .context("Failed to store audio payload")?;

        let title = upload
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| upload.filename.clone());

        let conn = db::open(&self.db_path)?;
        let meeting_id =
            MeetingRepository::insert(&conn, &title, &stored.url, &upload.filename)
                .context("Failed to create meeting record")?;

        let meeting = MeetingRepository::get(&conn, meeting_id)?
            .context("Meeting vanished after insert")?;

        info!(
            "Meeting {} created from upload: {} ({} bytes, {})",
            meeting_id,
            upload.filename,
            upload.bytes.len(),
            upload.media_type
        );

        Ok(meeting)
    }
}
