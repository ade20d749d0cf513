//! Service wiring: config, store, external clients, stages, API server.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::GroqChatClient;
use crate::api::{ApiServer, AppState};
use crate::config::Config;
use crate::db;
use crate::global;
use crate::meeting::{AudioIngest, SummarizationStage, TranscriptionStage};
use crate::storage::AudioStore;
use crate::transcription::GroqWhisperClient;

pub async fn run_service() -> Result<()> {
    info!("Starting recap service");

    let config = Config::load()?;
    let db_path = global::db_file()?;
    let audio_dir = global::audio_dir()?;

    // Open once up front so migrations run before the first request
    db::open(&db_path)?;

    let transcription_key = config.transcription.resolve_api_key().unwrap_or_default();
    if transcription_key.is_empty() {
        warn!(
            "Transcription API key not configured (GROQ_API_KEY or [transcription].api_key); \
             transcription triggers will fail"
        );
    }

    let analysis_key = config.analysis.resolve_api_key().unwrap_or_default();
    if analysis_key.is_empty() {
        warn!(
            "Analysis API key not configured (GROQ_API_KEY or [analysis].api_key); \
             summarization triggers will fail"
        );
    }

    let speech_to_text = GroqWhisperClient::new(
        transcription_key,
        config.transcription.api_endpoint.clone(),
        config.transcription.model.clone(),
    );

    let analysis = GroqChatClient::new(
        analysis_key,
        config.analysis.api_endpoint.clone(),
        config.analysis.model.clone(),
        config.analysis.temperature,
    );

    let ingest = Arc::new(AudioIngest::new(
        db_path.clone(),
        AudioStore::new(audio_dir.clone()),
        config.upload.max_bytes,
    ));

    let transcription = Arc::new(TranscriptionStage::new(
        db_path.clone(),
        AudioStore::new(audio_dir),
        Box::new(speech_to_text),
        config.transcription.language.clone(),
    ));

    let summarization = Arc::new(SummarizationStage::new(
        db_path.clone(),
        Box::new(analysis),
    ));

    let state = AppState {
        ingest,
        transcription,
        summarization,
        db_path,
    };

    info!("recap is ready!");
    info!(
        "Upload a recording: curl -F audio=@meeting.mp3 {}/upload",
        config.base_url()
    );

    ApiServer::new(
        config.server.host.clone(),
        config.server.port,
        config.upload.max_bytes,
        state,
    )
    .start()
    .await
}
