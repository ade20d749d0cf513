//! Meeting read endpoints: listing and the assembled detail view.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::{self, meetings::MeetingRepository};
use crate::meeting::assembler;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    /// Maximum results (default 100)
    pub limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/meetings", get(list_meetings))
        .route("/meetings/:id", get(get_meeting))
        .with_state(state)
}

/// GET /meetings - List meetings, newest first.
async fn list_meetings(
    Query(params): Query<ListParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let limit = params.limit.unwrap_or(100);

    let db_path = state.db_path.clone();
    let meetings = tokio::task::spawn_blocking(move || {
        let conn = db::open(&db_path)?;
        MeetingRepository::list(&conn, limit)
    })
    .await
    .map_err(|_| ApiError::internal("Meetings query task failed"))?
    .map_err(ApiError::from)?;

    Ok(Json(json!({ "meetings": meetings })))
}

/// GET /meetings/:id - Meeting plus latest transcript, latest summary, and
/// action items.
async fn get_meeting(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let db_path = state.db_path.clone();
    let details = tokio::task::spawn_blocking(move || {
        let conn = db::open(&db_path)?;
        assembler::assemble(&conn, id)
    })
    .await
    .map_err(|_| ApiError::internal("Meeting query task failed"))?
    .map_err(ApiError::from)?;

    match details {
        Some(details) => Ok(Json(serde_json::to_value(details).map_err(|e| {
            ApiError::internal(format!("Failed to serialize meeting details: {}", e))
        })?)),
        None => Err(ApiError::not_found("Meeting not found")),
    }
}
