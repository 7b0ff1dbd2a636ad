// HTTP + WebSocket routes

mod error;
mod http;
mod ws;

pub use error::ApiError;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::broadcast::Broadcaster;
use crate::history_repo::HistoryRepo;
use crate::snapshot_store::SnapshotStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<SnapshotStore>,
    pub(crate) broadcaster: Broadcaster,
    pub(crate) history_repo: Arc<HistoryRepo>,
}

pub fn app(
    store: Arc<SnapshotStore>,
    broadcaster: Broadcaster,
    history_repo: Arc<HistoryRepo>,
) -> Router {
    let state = AppState {
        store,
        broadcaster,
        history_repo,
    };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/metrics", get(http::metrics_handler)) // GET /api/metrics
        .route("/api/history", get(http::history_handler)) // GET /api/history?range=1h
        .route("/ws", get(ws::ws_metrics)) // WS /ws
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
