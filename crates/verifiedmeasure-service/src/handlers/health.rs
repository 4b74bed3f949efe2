//! Liveness check.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::config::StoreBackend;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Configured data-service backend. The backend itself is not contacted.
    pub store: &'static str,
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = match state.config.store_backend {
        StoreBackend::Rest => "rest",
        StoreBackend::Memory => "memory",
    };

    Json(HealthResponse {
        status: "ok",
        service: "verifiedmeasure",
        version: env!("CARGO_PKG_VERSION"),
        store,
    })
}
