//! Health check endpoints

use axum::{extract::State, routing::{get, post}, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::storage::StorageHealth;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" while durable storage is configured but not serving
    pub status: &'static str,
    pub module: &'static str,
    /// Crate version from Cargo.toml
    pub version: &'static str,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub storage: StorageHealth,
}

fn response(state: &AppState, storage: StorageHealth) -> HealthResponse {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    HealthResponse {
        status: if storage.is_degraded() { "degraded" } else { "ok" },
        module: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        storage,
    }
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = state.storage.health().await;
    Json(response(&state, storage))
}

/// POST /health/recheck
///
/// Probes the durable backend and makes it active again if it answers.
pub async fn health_recheck(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = state.storage.recheck().await;
    Json(response(&state, storage))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/recheck", post(health_recheck))
}
