//! salescribe-server library interface
//!
//! Exposes the ingestion pipeline, storage gateway, generation orchestrator
//! and HTTP router for the binary and for integration tests.

pub mod api;
pub mod error;
pub mod generation;
pub mod ingest;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use crate::generation::{GenerationOrchestrator, TextGenerator};
use crate::ingest::IngestPipeline;
use crate::storage::StorageGateway;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageGateway>,
    pub ingest: Arc<IngestPipeline>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        storage: Arc<StorageGateway>,
        generator: Arc<dyn TextGenerator>,
        agent_timeout: Duration,
    ) -> Self {
        Self {
            ingest: Arc::new(IngestPipeline::new(Arc::clone(&storage))),
            orchestrator: Arc::new(GenerationOrchestrator::new(
                Arc::clone(&storage),
                generator,
                agent_timeout,
            )),
            storage,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::upload_routes())
        .merge(api::generation_routes())
        .merge(api::article_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
