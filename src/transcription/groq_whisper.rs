use anyhow::{anyhow, Context};
use async_trait::async_trait;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{AudioPayload, SpeechToText, TranscriptionError, TranscriptionOutput};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Whisper transcription via Groq's OpenAI-compatible API.
pub struct GroqWhisperClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

/// Response body for `response_format=verbose_json`.
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    language: Option<String>,
    duration: Option<f64>,
}

impl GroqWhisperClient {
    pub fn new(api_key: String, endpoint: Option<String>, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        let base_url = endpoint.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        info!("Initialized Groq Whisper client with base URL: {}", base_url);

        Self {
            client,
            api_key,
            base_url,
            model,
        }
    }

    fn rate_limit_error(body: &str) -> TranscriptionError {
        let retry_after = parse_retry_hint(body);
        TranscriptionError::RateLimited {
            message: format!(
                "Rate limit exceeded. The transcription service is throttling requests. \
                 Please wait {} and try again, or upgrade your account.",
                retry_after
            ),
            retry_after,
        }
    }
}

/// Extract the suggested wait from the provider's error message, e.g.
/// "Please try again in 7m12.34s".
fn parse_retry_hint(body: &str) -> String {
    let re = Regex::new(r"[Pp]lease try again in (\d+m\d+\.?\d*s|\d+\.?\d*s|\d+m)")
        .expect("retry hint regex is valid");

    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "a few minutes".to_string())
}

#[async_trait]
impl SpeechToText for GroqWhisperClient {
    async fn transcribe(
        &self,
        audio: AudioPayload<'_>,
        language: &str,
    ) -> Result<TranscriptionOutput, TranscriptionError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        debug!(
            "Submitting {} bytes ({}) for transcription with model {}",
            audio.bytes.len(),
            audio.media_type,
            self.model
        );

        let file_part = Part::bytes(audio.bytes.to_vec())
            .file_name(audio.filename.to_string())
            .mime_str(audio.media_type)
            .context("Invalid audio media type")?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        if !language.is_empty() && language != "auto" {
            form = form.text("language", language.to_string());
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .context("Failed to reach transcription service")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read transcription response body")?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || body.contains("rate_limit_exceeded")
        {
            error!("Transcription rate limited: {}", body);
            return Err(Self::rate_limit_error(&body));
        }

        if !status.is_success() {
            error!("Transcription request failed with status {}: {}", status, body);
            return Err(anyhow!(
                "Transcription request failed with status {}: {}",
                status,
                body
            )
            .into());
        }

        let transcription: VerboseTranscription =
            serde_json::from_str(&body).context("Failed to parse transcription response")?;

        info!(
            "Transcription complete: {} chars, language={}, duration={:.1}s",
            transcription.text.len(),
            transcription.language.as_deref().unwrap_or("unknown"),
            transcription.duration.unwrap_or(0.0)
        );

        Ok(TranscriptionOutput {
            text: transcription.text,
            language: transcription.language,
            duration: transcription.duration,
        })
    }

    fn name(&self) -> &'static str {
        "Groq Whisper API"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_hint_full_form() {
        let body = r#"{"error":{"message":"Rate limit reached. Please try again in 7m12.34s.","type":"rate_limit_exceeded"}}"#;
        assert_eq!(parse_retry_hint(body), "7m12.34s");
    }

    #[test]
    fn test_parse_retry_hint_seconds_only() {
        assert_eq!(parse_retry_hint("Please try again in 59.2s"), "59.2s");
    }

    #[test]
    fn test_parse_retry_hint_fallback() {
        assert_eq!(parse_retry_hint("too many requests"), "a few minutes");
    }

    #[test]
    fn test_is_configured() {
        let client = GroqWhisperClient::new("gsk_test".to_string(), None, "whisper-large-v3-turbo".to_string());
        assert!(client.is_configured());

        let client = GroqWhisperClient::new(String::new(), None, "whisper-large-v3-turbo".to_string());
        assert!(!client.is_configured());
    }

    #[test]
    fn test_parse_verbose_response() {
        let body = r#"{"text":"Hello world.","language":"en","duration":12.42,"x_groq":{"id":"req_1"}}"#;
        let parsed: VerboseTranscription = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text, "Hello world.");
        assert_eq!(parsed.language.as_deref(), Some("en"));
        assert_eq!(parsed.duration, Some(12.42));
    }
}
