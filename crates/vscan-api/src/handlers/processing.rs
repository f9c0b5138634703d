//! Processing queue handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use vscan_models::{EnqueueOutcome, QueueStatus};

use crate::error::{ApiError, ApiResult};
use crate::handlers::SuccessResponse;
use crate::state::AppState;

/// Body of `POST /api/processing/queue`.
#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub paths: Vec<String>,
}

/// `GET /api/processing/status`
pub async fn get_status(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(state.queue.status())
}

/// `POST /api/processing/queue`
pub async fn enqueue(
    State(state): State<AppState>,
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> ApiResult<Json<EnqueueOutcome>> {
    let Json(request) =
        body.map_err(|_| ApiError::bad_request("paths must be an array of strings"))?;
    Ok(Json(state.queue.enqueue(&request.paths)?))
}

/// `DELETE /api/processing/queue`
pub async fn clear_queue(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.queue.clear();
    Json(SuccessResponse::ok())
}
