//! Stage trigger endpoints.
//!
//! Each trigger runs one stage to completion and returns its output; the
//! short-circuit replay of an existing result comes back as a plain 200 so
//! duplicate triggers stay harmless for the polling client.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct StageRequest {
    pub meeting_id: i64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/transcribe", post(trigger_transcription))
        .route("/summarize", post(trigger_summarization))
        .with_state(state)
}

/// POST /transcribe - Run the transcription stage for a meeting.
async fn trigger_transcription(
    State(state): State<AppState>,
    Json(request): Json<StageRequest>,
) -> ApiResult<Json<Value>> {
    info!(
        "Transcription trigger received for meeting {}",
        request.meeting_id
    );

    let outcome = state.transcription.run(request.meeting_id).await?;

    let mut body = json!({
        "success": true,
        "transcript": outcome.transcript,
        "duration": outcome.duration_seconds,
    });
    if outcome.already_existed {
        body["message"] = json!("Transcript already exists");
    }

    Ok(Json(body))
}

/// POST /summarize - Run the summarization stage for a meeting.
async fn trigger_summarization(
    State(state): State<AppState>,
    Json(request): Json<StageRequest>,
) -> ApiResult<Json<Value>> {
    info!(
        "Summarization trigger received for meeting {}",
        request.meeting_id
    );

    let outcome = state.summarization.run(request.meeting_id).await?;

    let mut body = json!({
        "success": true,
        "summary": outcome.summary,
        "action_items": outcome.action_items,
    });
    if outcome.already_existed {
        body["message"] = json!("Summary already exists");
    }

    Ok(Json(body))
}
