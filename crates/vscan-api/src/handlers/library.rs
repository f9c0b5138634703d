//! Library handlers: search, refresh, move, delete and durations.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use vscan_library::{LibraryQuery, SearchPage};
use vscan_models::validate_relative_path;

use crate::error::{ApiError, ApiResult};
use crate::handlers::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PathRequest {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub success: bool,
    pub new_path: String,
}

#[derive(Debug, Deserialize)]
pub struct DurationQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DurationResponse {
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PathsRequest {
    pub paths: Vec<String>,
}

/// `POST /api/library/search`. A missing or unreadable body means defaults.
pub async fn search_library(
    State(state): State<AppState>,
    body: Option<Json<LibraryQuery>>,
) -> Json<SearchPage> {
    let query = body.map(|Json(q)| q).unwrap_or_default();
    Json(state.library.search(&query).await)
}

/// `POST /api/library/refresh`
pub async fn refresh_library(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let count = state.library.refresh().await?;
    Ok(Json(RefreshResponse { count }))
}

/// `POST /api/library/move`
pub async fn move_file(
    State(state): State<AppState>,
    body: Result<Json<PathRequest>, JsonRejection>,
) -> ApiResult<Json<MoveResponse>> {
    let Json(request) = body.map_err(|_| ApiError::bad_request("Missing path"))?;
    let new_path = state.library.move_file(&request.path).await?;
    Ok(Json(MoveResponse {
        success: true,
        new_path,
    }))
}

/// `DELETE /api/files/*path`
pub async fn delete_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    state.library.delete_file(&path).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// `GET /api/library/duration?path=`
pub async fn get_duration(
    State(state): State<AppState>,
    Query(query): Query<DurationQuery>,
) -> ApiResult<Json<DurationResponse>> {
    let path = query.path.unwrap_or_default();
    let path = validate_relative_path(&path).map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(Json(DurationResponse {
        duration: state.metadata.get_duration(path).await,
    }))
}

/// `POST /api/library/durations`
pub async fn get_durations(
    State(state): State<AppState>,
    body: Result<Json<PathsRequest>, JsonRejection>,
) -> ApiResult<Json<BTreeMap<String, Option<f64>>>> {
    let Json(request) =
        body.map_err(|_| ApiError::bad_request("paths must be an array of strings"))?;
    Ok(Json(state.metadata.get_durations(&request.paths).await))
}
