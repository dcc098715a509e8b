use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::history::{History, HistoryEntry};

const HISTORY_LIMIT: usize = 20;

#[derive(Clone)]
pub struct ApiState {
    pub history: Arc<History>,
}

/// Liveness routes for the process supervisor plus a peek at recent verdicts.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(|| async { "ok" }))
        .route("/debug/history", get(debug_history))
        .with_state(state)
}

async fn status() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn debug_history(State(state): State<ApiState>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.snapshot_last_n(HISTORY_LIMIT))
}

/// Bind and serve until the task is dropped.
pub async fn serve(router: Router, port: u16) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(target: "api", "Server listening on port {port}");
    axum::serve(listener, router)
        .await
        .context("http server")
}
