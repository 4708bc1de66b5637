// src/routes/readings.rs
//! Feed endpoints: the next reading of the cyclic feed and the recent
//! history used to bootstrap the front-end chart.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{AppState, Reading};

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new()
        .route("/api/voltage-data", get(next_reading))
        .route("/api/csv-data", get(recent_readings))
}

#[derive(Debug, Serialize)]
struct ReadingResponse {
    // ---
    #[serde(flatten)]
    reading: Reading,
    success: bool,
}

#[derive(Debug, Serialize)]
struct RecentResponse {
    data: Vec<Reading>,
    success: bool,
}

/// `limit` from the query string; absent or unparseable falls back to `default`.
fn requested_limit(params: &HashMap<String, String>, default: usize) -> usize {
    match params.get("limit").map(|v| v.trim().parse::<usize>()) {
        Some(Ok(limit)) => limit,
        Some(Err(e)) => {
            warn!("Ignoring invalid limit {:?}: {}", params.get("limit"), e);
            default
        }
        None => default,
    }
}

/// Handle `GET /api/voltage-data`.
async fn next_reading(State(state): State<Arc<AppState>>) -> Json<ReadingResponse> {
    // ---
    let reading = state.feed.next();
    debug!("GET /api/voltage-data - {:?}", reading);
    Json(ReadingResponse {
        reading,
        success: true,
    })
}

/// Handle `GET /api/csv-data`.
async fn recent_readings(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Json<RecentResponse> {
    // ---
    let limit = requested_limit(&params, state.config.recent_limit);
    let data = state.feed.recent(limit);
    debug!("GET /api/csv-data - returning {} readings", data.len());
    Json(RecentResponse {
        data,
        success: true,
    })
}
