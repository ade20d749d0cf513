//! Audio blob store.
//!
//! Uploaded payloads are written under the audio data directory at a
//! generated unique key; the stored location is handed back to the caller
//! and later resolved by the transcription stage. Locations may also be
//! HTTP(S) URLs (e.g. a meeting imported by reference), so fetching handles
//! both.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// A stored audio payload.
#[derive(Debug, Clone)]
pub struct StoredAudio {
    /// Key relative to the audio directory, e.g. `meetings/20260806-103000-1a2b3c4d.mp3`.
    pub key: String,
    /// Absolute location used to retrieve the payload later.
    pub url: String,
}

pub struct AudioStore {
    audio_dir: PathBuf,
    client: reqwest::Client,
}

impl AudioStore {
    pub fn new(audio_dir: PathBuf) -> Self {
        Self {
            audio_dir,
            client: reqwest::Client::new(),
        }
    }

    /// Store a payload under a generated key, preserving the original
    /// file extension.
    pub fn store(&self, bytes: &[u8], original_filename: &str) -> Result<StoredAudio> {
        let key = self.generate_key(original_filename);
        let path = self.audio_dir.join(&key);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create audio directory")?;
        }

        std::fs::write(&path, bytes).context("Failed to write audio file")?;

        info!("Stored audio payload: {:?} ({} bytes)", path, bytes.len());

        Ok(StoredAudio {
            key,
            url: path.to_string_lossy().to_string(),
        })
    }

    /// Retrieve a payload from its stored location: HTTP(S) URL or local
    /// filesystem path.
    pub async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if location.starts_with("http://") || location.starts_with("https://") {
            debug!("Downloading audio from {}", location);

            let response = self
                .client
                .get(location)
                .send()
                .await
                .context("Failed to download audio file")?;

            let status = response.status();
            if !status.is_success() {
                bail!("Failed to download audio file: HTTP {}", status);
            }

            let bytes = response
                .bytes()
                .await
                .context("Failed to read audio download body")?;

            return Ok(bytes.to_vec());
        }

        debug!("Reading audio from {:?}", location);
        tokio::fs::read(location)
            .await
            .with_context(|| format!("Failed to read audio file at {}", location))
    }

    fn generate_key(&self, original_filename: &str) -> String {
        let ext = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");

        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let suffix = Uuid::new_v4().simple().to_string();

        format!("meetings/{}-{}.{}", timestamp, &suffix[..8], ext)
    }
}
