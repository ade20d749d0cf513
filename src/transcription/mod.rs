//! Speech-to-text capability.
//!
//! The pipeline talks to transcription through the [`SpeechToText`] trait;
//! the production implementation is [`GroqWhisperClient`]. Rate limiting is
//! a distinguished error so callers can surface the suggested wait instead
//! of retrying blindly.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

mod groq_whisper;

pub use groq_whisper::GroqWhisperClient;

/// An audio payload handed to the transcription service.
pub struct AudioPayload<'a> {
    pub bytes: &'a [u8],
    pub filename: &'a str,
    pub media_type: &'a str,
}

/// Verbose transcription output: text plus detected language and duration.
#[derive(Debug, Clone)]
pub struct TranscriptionOutput {
    pub text: String,
    pub language: Option<String>,
    /// Audio duration in seconds, fractional.
    pub duration: Option<f64>,
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// The service is throttling us; `retry_after` is its suggested wait.
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio payload, requesting verbose output.
    async fn transcribe(
        &self,
        audio: AudioPayload<'_>,
        language: &str,
    ) -> Result<TranscriptionOutput, TranscriptionError>;

    fn name(&self) -> &'static str;

    /// Whether the client has a credential to work with.
    fn is_configured(&self) -> bool;
}
