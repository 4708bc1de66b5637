// src/routes/health.rs
//! Liveness endpoint for the voltwatch backend.
//!
//! Exposes `/health` for container orchestrators and CI scripts to verify
//! that the service is up and answering HTTP requests. It is a sibling
//! module in the `routes` directory; the gateway (`mod.rs`) merges this
//! subrouter into the top-level API router.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Does not touch the feed or the messaging destination.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges cleanly with the gateway
/// router regardless of the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
