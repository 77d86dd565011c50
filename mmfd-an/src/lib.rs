//! mmfd-an library interface
//!
//! Per-modality scorers, the fusion engine and the HTTP API of the
//! analysis service. Exposed as a library for integration tests and
//! benchmarks.

pub mod api;
pub mod error;
pub mod fusion;
pub mod scoring;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use fusion::FusionEngine;
use scoring::{AudioScorer, TextScorer, VideoScorer};
use std::sync::Arc;
use store::AnalysisStore;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (decoded audio/video arrive inline)
pub const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Scorers constructed once at startup and shared read-only
#[derive(Default)]
pub struct ScorerSet {
    pub text: TextScorer,
    pub audio: AudioScorer,
    pub video: VideoScorer,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FusionEngine>,
    pub scorers: Arc<ScorerSet>,
    pub store: AnalysisStore,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(engine: FusionEngine, scorers: ScorerSet) -> Self {
        Self {
            engine: Arc::new(engine),
            scorers: Arc::new(scorers),
            store: AnalysisStore::new(),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the default store (e.g. with a configured capacity)
    pub fn with_store(mut self, store: AnalysisStore) -> Self {
        self.store = store;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::analyze_routes())
        .merge(api::fusion_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
