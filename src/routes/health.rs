use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::debug;

use crate::services::catalog_service::CatalogState;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness))
        .route("/ready", get(readiness))
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub catalog_state: CatalogState,
    pub catalog_loaded: bool,
}

async fn liveness() -> &'static str {
    debug!("GET /health - Liveness check");
    "OK"
}

/// Ready once the process is serving; reports whether a catalog snapshot is held.
async fn readiness(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let catalog_state = state.catalog.state();
    let catalog_loaded = state.catalog.snapshot().is_some();
    debug!("GET /health/ready - catalog {:?}, loaded={}", catalog_state, catalog_loaded);

    Json(ReadinessResponse {
        status: if catalog_loaded { "ready" } else { "degraded" },
        catalog_state,
        catalog_loaded,
    })
}
