// src/routes/status.rs
//! Service status summary shown on the dashboard.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

// ---

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/status", get(status))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    // ---
    status: &'static str,
    telegram_configured: bool,
    data_source: &'static str,
    readings_loaded: usize,
    alert_cooling: bool,
}

/// Handle `GET /api/status`.
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "online",
        telegram_configured: state.config.telegram_credentials().is_some(),
        data_source: state.feed.data_source(),
        readings_loaded: state.feed.len(),
        alert_cooling: state.notifier.is_cooling(),
    })
}
