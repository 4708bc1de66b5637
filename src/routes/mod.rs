use std::{path::Path, sync::Arc};

use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::AppState;

mod alerts;
mod health;
mod readings;
mod status;

// ---

/// Build the full HTTP surface: API routes, then static files for everything else.
pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(alerts::router())
        .merge(status::router())
        .merge(health::router())
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}
