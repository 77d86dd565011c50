//! Per-modality analysis handlers
//!
//! POST /analyze/text, /analyze/audio, /analyze/video
//!
//! Scoring is CPU-bound and runs on the blocking pool. Each result is
//! stored under a fresh analysis ID for later fusion.

use axum::{extract::State, routing::post, Json, Router};
use mmfd_common::{Modality, ModalityResult};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    scoring::{AudioArtifact, Scorer, TextArtifact, VideoArtifact},
    store::AnalysisRecord,
    AppState, ScorerSet,
};

/// POST /analyze/text
pub async fn analyze_text(
    State(state): State<AppState>,
    Json(artifact): Json<TextArtifact>,
) -> ApiResult<Json<AnalysisRecord>> {
    run_scoring(&state, Modality::Text, move |scorers| {
        scorers.text.score(&artifact)
    })
    .await
}

/// POST /analyze/audio
pub async fn analyze_audio(
    State(state): State<AppState>,
    Json(artifact): Json<AudioArtifact>,
) -> ApiResult<Json<AnalysisRecord>> {
    run_scoring(&state, Modality::Audio, move |scorers| {
        scorers.audio.score(&artifact)
    })
    .await
}

/// POST /analyze/video
pub async fn analyze_video(
    State(state): State<AppState>,
    Json(artifact): Json<VideoArtifact>,
) -> ApiResult<Json<AnalysisRecord>> {
    run_scoring(&state, Modality::Video, move |scorers| {
        scorers.video.score(&artifact)
    })
    .await
}

async fn run_scoring<F>(state: &AppState, modality: Modality, job: F) -> ApiResult<Json<AnalysisRecord>>
where
    F: FnOnce(&ScorerSet) -> ModalityResult + Send + 'static,
{
    let scorers = Arc::clone(&state.scorers);
    let result = match tokio::task::spawn_blocking(move || job(&scorers)).await {
        Ok(result) => result,
        Err(e) => {
            let message = format!("{} scoring task failed: {}", modality, e);
            error!("{}", message);
            *state.last_error.write().await = Some(message.clone());
            return Err(ApiError::Internal(message));
        }
    };

    let record = state.store.insert(modality, result).await;
    info!(
        analysis_id = %record.id,
        modality = %modality,
        score = record.result.score,
        confidence = record.result.confidence,
        indicators = record.result.indicators.len(),
        "Analysis stored"
    );

    Ok(Json(record))
}

/// Build per-modality analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze/text", post(analyze_text))
        .route("/analyze/audio", post(analyze_audio))
        .route("/analyze/video", post(analyze_video))
}
