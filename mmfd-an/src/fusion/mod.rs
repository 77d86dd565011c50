// Fusion Engine - Multi-Modal Verdict
//
// Combines per-modality results into one credibility score, verdict and
// confidence.
// Pipeline: weights (re-normalized) → strategy → agreement → severe boost → verdict

pub mod agreement;
pub mod explanation;
pub mod strategies;
pub mod weights;

use agreement::Agreement;
use mmfd_common::config::{FusionConfig, FusionStrategy};
use mmfd_common::{AnalysisRequest, ConfidenceLevel, Modality, ModalityResult, Verdict};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

/// Fusion errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FusionError {
    #[error("Insufficient input: at least one modality result is required")]
    InsufficientInput,
}

/// Fused verdict for one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionResult {
    /// Credibility in [0, 100], rounded to one decimal
    pub final_score: f64,

    pub verdict: Verdict,

    /// Overall confidence in [0, 1]
    pub confidence: f64,

    pub confidence_level: ConfidenceLevel,

    /// Per-modality results that went into the fusion
    pub modality_contributions: BTreeMap<Modality, ModalityResult>,

    /// Re-normalized weights actually applied (sum to 1.0)
    pub weights_used: BTreeMap<Modality, f64>,

    pub fusion_strategy: FusionStrategy,

    /// Cross-modal agreement; absent with a single modality
    pub agreement: Option<Agreement>,

    /// Confidence added for severe indicators
    pub severe_boost: f64,

    pub explanation: String,
}

/// Score precision shared by the verdict, the JSON and the explanation
fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// Stateless fusion engine; configuration is fixed at construction
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    /// Create an engine from validated tables
    pub fn new(config: FusionConfig) -> mmfd_common::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Configured default strategy
    pub fn strategy(&self) -> FusionStrategy {
        self.config.strategy
    }

    /// Base weights re-normalized over `present` modalities
    pub fn normalized_weights(
        &self,
        present: impl IntoIterator<Item = Modality>,
    ) -> BTreeMap<Modality, f64> {
        weights::normalize(&self.config.weights, present)
    }

    /// Fuse with the configured strategy
    pub fn fuse(
        &self,
        results: &BTreeMap<Modality, ModalityResult>,
    ) -> Result<FusionResult, FusionError> {
        self.fuse_with(self.config.strategy, results)
    }

    /// Fuse only the modalities the request declares available
    pub fn fuse_request(
        &self,
        request: &AnalysisRequest,
        results: &BTreeMap<Modality, ModalityResult>,
    ) -> Result<FusionResult, FusionError> {
        self.fuse_request_with(self.config.strategy, request, results)
    }

    pub fn fuse_request_with(
        &self,
        strategy: FusionStrategy,
        request: &AnalysisRequest,
        results: &BTreeMap<Modality, ModalityResult>,
    ) -> Result<FusionResult, FusionError> {
        let available: BTreeMap<Modality, ModalityResult> = results
            .iter()
            .filter(|(modality, _)| request.includes(**modality))
            .map(|(modality, result)| (*modality, result.clone()))
            .collect();
        debug!(
            "Request {}: {} of {} results available",
            request.id,
            available.len(),
            results.len()
        );
        self.fuse_with(strategy, &available)
    }

    /// Fuse with an explicit strategy
    pub fn fuse_with(
        &self,
        strategy: FusionStrategy,
        results: &BTreeMap<Modality, ModalityResult>,
    ) -> Result<FusionResult, FusionError> {
        if results.is_empty() {
            return Err(FusionError::InsufficientInput);
        }

        // Results from callers may violate the range/subset invariants
        let results: BTreeMap<Modality, ModalityResult> = results
            .iter()
            .map(|(modality, result)| (*modality, result.clone().normalized()))
            .collect();

        let weights_used = self.normalized_weights(results.keys().copied());
        let base = strategies::combine(strategy, &results, &weights_used);

        let scores: Vec<f64> = results.values().map(|r| r.score).collect();
        let (confidence, agreement) =
            agreement::apply(&scores, base.confidence, &self.config.agreement);

        let severe_boost: f64 = results
            .iter()
            .map(|(modality, r)| self.config.severe_boost.get(*modality) * r.severe_count() as f64)
            .sum();
        let confidence = (confidence + severe_boost).clamp(0.0, 1.0);

        let final_score = round_score(base.score.clamp(0.0, 100.0));
        let verdict = self.verdict(final_score, confidence);

        let mut fused = FusionResult {
            final_score,
            verdict,
            confidence,
            confidence_level: ConfidenceLevel::from_confidence(confidence),
            modality_contributions: results,
            weights_used,
            fusion_strategy: strategy,
            agreement,
            severe_boost,
            explanation: String::new(),
        };
        fused.explanation = explanation::build(&fused, &self.config.agreement);

        info!(
            "Fusion ({}): {} modalities → score={:.1}, verdict={}, confidence={:.3}",
            strategy,
            fused.modality_contributions.len(),
            fused.final_score,
            fused.verdict,
            fused.confidence
        );

        Ok(fused)
    }

    fn verdict(&self, score: f64, confidence: f64) -> Verdict {
        if let Some(min_confidence) = self.config.min_confidence {
            if confidence < min_confidence {
                return Verdict::Uncertain;
            }
        }

        let thresholds = &self.config.verdict;
        if score < thresholds.fake_below {
            Verdict::Fake
        } else if score >= thresholds.real_at_or_above {
            Verdict::Real
        } else {
            Verdict::Uncertain
        }
    }
}
