//! Fusion handlers
//!
//! GET /fusion-strategies, POST /fuse, POST /analyze/complete

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use mmfd_common::config::FusionStrategy;
use mmfd_common::{AnalysisRequest, Modality, ModalityResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    fusion::FusionResult,
    AppState,
};

/// One entry of GET /fusion-strategies
#[derive(Debug, Serialize)]
pub struct StrategyInfo {
    pub name: FusionStrategy,
    pub description: &'static str,
    pub default: bool,
}

#[derive(Debug, Serialize)]
pub struct StrategiesResponse {
    pub strategies: Vec<StrategyInfo>,
}

/// POST /fuse request: caller-supplied per-modality results
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuseRequest {
    pub modalities: BTreeMap<Modality, ModalityResult>,
    #[serde(default)]
    pub fusion_strategy: Option<String>,
}

/// POST /analyze/complete request: IDs of stored per-modality analyses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteAnalysisRequest {
    #[serde(default)]
    pub text_analysis_id: Option<Uuid>,
    #[serde(default)]
    pub audio_analysis_id: Option<Uuid>,
    #[serde(default)]
    pub video_analysis_id: Option<Uuid>,
    #[serde(default)]
    pub fusion_strategy: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteAnalysisResponse {
    pub analysis_id: Uuid,
    #[serde(flatten)]
    pub result: FusionResult,
}

/// GET /fusion-strategies
pub async fn list_strategies(State(state): State<AppState>) -> Json<StrategiesResponse> {
    let configured = state.engine.strategy();
    Json(StrategiesResponse {
        strategies: FusionStrategy::ALL
            .into_iter()
            .map(|strategy| StrategyInfo {
                name: strategy,
                description: strategy.description(),
                default: strategy == configured,
            })
            .collect(),
    })
}

/// POST /fuse
pub async fn fuse(
    State(state): State<AppState>,
    Json(request): Json<FuseRequest>,
) -> ApiResult<Json<FusionResult>> {
    let strategy = resolve_strategy(&state, request.fusion_strategy.as_deref())?;
    let result = state.engine.fuse_with(strategy, &request.modalities)?;
    Ok(Json(result))
}

/// POST /analyze/complete
///
/// Fuses previously stored analyses. Each ID must exist and belong to the
/// modality of the slot it is passed in.
pub async fn complete_analysis(
    State(state): State<AppState>,
    Json(request): Json<CompleteAnalysisRequest>,
) -> ApiResult<Json<CompleteAnalysisResponse>> {
    let strategy = resolve_strategy(&state, request.fusion_strategy.as_deref())?;

    let slots = [
        (Modality::Text, request.text_analysis_id),
        (Modality::Audio, request.audio_analysis_id),
        (Modality::Video, request.video_analysis_id),
    ];

    let mut results = BTreeMap::new();
    for (modality, id) in slots {
        let Some(id) = id else { continue };
        let record = state
            .store
            .get(id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Analysis {} not found", id)))?;
        if record.modality != modality {
            return Err(ApiError::BadRequest(format!(
                "Analysis {} is a {} analysis, not {}",
                id, record.modality, modality
            )));
        }
        results.insert(modality, record.result);
    }

    let analysis = AnalysisRequest::new(results.keys().copied());
    let result = state.engine.fuse_request_with(strategy, &analysis, &results)?;

    info!(
        analysis_id = %analysis.id,
        verdict = %result.verdict,
        score = result.final_score,
        "Complete analysis fused"
    );

    Ok(Json(CompleteAnalysisResponse {
        analysis_id: analysis.id,
        result,
    }))
}

fn resolve_strategy(state: &AppState, name: Option<&str>) -> ApiResult<FusionStrategy> {
    match name {
        Some(name) => name
            .parse::<FusionStrategy>()
            .map_err(|e| ApiError::BadRequest(e.to_string())),
        None => Ok(state.engine.strategy()),
    }
}

/// Build fusion routes
pub fn fusion_routes() -> Router<AppState> {
    Router::new()
        .route("/fusion-strategies", get(list_strategies))
        .route("/fuse", post(fuse))
        .route("/analyze/complete", post(complete_analysis))
}
