use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use scanboard_core::cache::CachedScan;
use scanboard_core::domain::scan::{ScanRecord, SnapshotSummary};
use scanboard_core::error::ScanError;

/// Latest annotated scan, served from cache within the TTL window.
pub async fn get_scan(State(state): State<AppState>) -> Result<Json<CachedScan>, ApiError> {
    scan_with(&state, false).await
}

/// Same as `get_scan` but bypasses the TTL window.
pub async fn refresh_scan(State(state): State<AppState>) -> Result<Json<CachedScan>, ApiError> {
    scan_with(&state, true).await
}

async fn scan_with(state: &AppState, force: bool) -> Result<Json<CachedScan>, ApiError> {
    let Some(cache) = &state.cache else {
        return Err(ApiError::unavailable("scan source not configured"));
    };

    let settings = state
        .trackers
        .sizing_settings()
        .map_err(ApiError::internal)?;

    cache
        .get_or_refresh(force, &settings)
        .await
        .map(Json)
        .map_err(cold_failure)
}

/// Only cold-cache failures reach the handler (warm failures degrade to
/// stale-serve inside the cache), so the message says so explicitly.
fn cold_failure(err: ScanError) -> ApiError {
    let status = match &err {
        ScanError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
        ScanError::SourceEmpty | ScanError::MalformedGrid { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ScanError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    ApiError::new(status, format!("no scan data available yet: {err}"))
}

pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<SnapshotSummary>>, ApiError> {
    state
        .history
        .list()
        .map(Json)
        .map_err(|err| ApiError::internal(err.into()))
}

pub async fn get_history_entry(
    State(state): State<AppState>,
    Path(scan_time): Path<String>,
) -> Result<Json<ScanRecord>, ApiError> {
    state
        .history
        .load(&scan_time)
        .map_err(|err| ApiError::internal(err.into()))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no snapshot for scan_time {scan_time}")))
}
