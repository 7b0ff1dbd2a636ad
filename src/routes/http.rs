// GET handlers: version, current metrics, history

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::history_repo::now_ms;
use crate::history_service::{HistoryRange, query_history};
use crate::models::{HistoryPoint, Snapshot};

#[derive(Debug, Deserialize)]
pub(super) struct HistoryParams {
    range: Option<String>,
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/metrics: current snapshot, same payload as the `metrics` push event.
pub(super) async fn metrics_handler(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.store.read())
}

/// GET /api/history?range=1h|6h|24h|7d; unknown or missing range means 1h.
pub(super) async fn history_handler(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<HistoryPoint>>, ApiError> {
    let range = HistoryRange::parse(params.range.as_deref());
    let now = now_ms().map_err(ApiError::Clock)?;
    let points = query_history(&state.history_repo, range, now)
        .await
        .map_err(ApiError::Storage)?;
    Ok(Json(points))
}
