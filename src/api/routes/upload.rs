//! Upload endpoint: multipart audio in, meeting record out.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::meeting::AudioUpload;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload_audio))
        .with_state(state)
}

/// POST /upload - Create a meeting from a multipart audio upload.
async fn upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut audio: Option<(Vec<u8>, String, String)> = None;
    let mut title: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("audio") => {
                let filename = field
                    .file_name()
                    .unwrap_or("audio.mp3")
                    .to_string();
                let media_type = field
                    .content_type()
                    .ok_or_else(|| {
                        ApiError::bad_request("Audio field is missing a content type")
                    })?
                    .to_string();

                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::payload_too_large(format!("Failed to read audio payload: {}", e))
                })?;

                audio = Some((bytes.to_vec(), filename, media_type));
            }
            Some("title") => {
                title = field.text().await.ok().filter(|t| !t.is_empty());
            }
            _ => {}
        }
    }

    let (bytes, filename, media_type) =
        audio.ok_or_else(|| ApiError::bad_request("No audio file provided"))?;

    info!(
        "Upload received: {} ({} bytes, {})",
        filename,
        bytes.len(),
        media_type
    );

    let upload = AudioUpload {
        bytes,
        filename,
        media_type,
        title,
    };

    let ingest = state.ingest.clone();
    let meeting = tokio::task::spawn_blocking(move || ingest.ingest(upload))
        .await
        .map_err(|_| ApiError::internal("Upload task failed"))??;

    Ok((StatusCode::CREATED, Json(json!({ "meeting": meeting }))))
}
