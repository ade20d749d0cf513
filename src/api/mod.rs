//! REST API server for recap.
//!
//! Provides HTTP endpoints for:
//! - Uploading a meeting recording (POST /upload)
//! - Listing meetings and reading assembled results (GET /meetings, /meetings/:id)
//! - Triggering pipeline stages (POST /transcribe, POST /summarize)

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{extract::DefaultBodyLimit, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::meeting::{AudioIngest, SummarizationStage, TranscriptionStage};

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<AudioIngest>,
    pub transcription: Arc<TranscriptionStage>,
    pub summarization: Arc<SummarizationStage>,
    pub db_path: PathBuf,
}

pub struct ApiServer {
    host: String,
    port: u16,
    max_upload_bytes: usize,
    state: AppState,
}

impl ApiServer {
    pub fn new(host: String, port: u16, max_upload_bytes: usize, state: AppState) -> Self {
        Self {
            host,
            port,
            max_upload_bytes,
            state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            // Root and version endpoints
            .route("/", get(status))
            .route("/version", get(version))
            // Pipeline routes
            .merge(routes::upload::router(self.state.clone()))
            .merge(routes::meetings::router(self.state.clone()))
            .merge(routes::stages::router(self.state))
            // Leave headroom above the ingest ceiling so oversize payloads
            // reach the handler and get the descriptive 413
            .layer(DefaultBodyLimit::max(self.max_upload_bytes + 1024 * 1024));

        let listener =
            tokio::net::TcpListener::bind(&format!("{}:{}", self.host, self.port)).await?;

        info!("API server listening on http://{}:{}", self.host, self.port);
        info!("Endpoints:");
        info!("  GET  /              - Service info");
        info!("  GET  /version       - Get version info");
        info!("  POST /upload        - Upload a meeting recording");
        info!("  GET  /meetings      - List meetings");
        info!("  GET  /meetings/:id  - Meeting with transcript, summary, action items");
        info!("  POST /transcribe    - Trigger the transcription stage");
        info!("  POST /summarize     - Trigger the summarization stage");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "recap",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "recap"
    }))
}
