// Per-Modality Scorers
//
// Each scorer inspects one decoded artifact and produces a ModalityResult:
// credibility score (0-100), confidence within the modality's band, and the
// named indicators whose thresholds were crossed.
// 3 scorers: Text, Audio, Video

pub mod audio_scorer;
pub mod lexicon;
pub mod text_scorer;
pub mod video_scorer;

pub use audio_scorer::{AudioArtifact, AudioScorer};
pub use text_scorer::{TextArtifact, TextClassifier, TextScorer};
pub use video_scorer::{FaceBox, FaceDetector, Frame, ProvidedFaces, VideoArtifact, VideoScorer};

use mmfd_common::{Modality, ModalityResult};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Confidence value (0.0-1.0)
pub type Confidence = f64;

/// Artifact could not be scored
///
/// Never escapes `Scorer::score`; it is turned into the neutral result so a
/// decoding hiccup in one modality does not fail the whole analysis.
#[derive(Debug, Error, PartialEq)]
pub enum ArtifactError {
    #[error("Artifact has no usable content: {0}")]
    Empty(String),

    #[error("Artifact is malformed: {0}")]
    Malformed(String),
}

/// Scorer trait - all per-modality scorers implement this
pub trait Scorer: Send + Sync {
    /// Decoded input this scorer understands
    type Artifact;

    /// Modality this scorer produces results for
    fn modality(&self) -> Modality;

    /// Score an artifact, reporting unusable input as an error
    fn analyze(&self, artifact: &Self::Artifact) -> Result<ModalityResult, ArtifactError>;

    /// Documented confidence band for this modality
    fn confidence_range(&self) -> (Confidence, Confidence);

    /// Score an artifact, falling back to the neutral result
    fn score(&self, artifact: &Self::Artifact) -> ModalityResult {
        match self.analyze(artifact) {
            Ok(result) => result,
            Err(e) => {
                debug!(modality = %self.modality(), "Using neutral result: {}", e);
                ModalityResult::neutral(self.confidence_range().0)
            }
        }
    }
}

/// Accumulates raised indicators and the suspicion they contribute
#[derive(Debug, Default)]
pub(crate) struct Signals {
    indicators: BTreeSet<String>,
    severe: BTreeSet<String>,
    suspicion: f64,
}

impl Signals {
    /// Raise an indicator; `severe` adds it to the severe set too
    pub(crate) fn raise(&mut self, name: &str, severe: bool, weight: f64) {
        self.indicators.insert(name.to_string());
        if severe {
            self.severe.insert(name.to_string());
        }
        self.suspicion += weight;
    }

    /// Add suspicion without raising a named indicator
    pub(crate) fn add_suspicion(&mut self, weight: f64) {
        self.suspicion += weight;
    }

    pub(crate) fn count(&self) -> usize {
        self.indicators.len()
    }

    pub(crate) fn severe_count(&self) -> usize {
        self.severe.len()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.indicators.contains(name)
    }

    /// Suspicion capped at 1.0
    pub(crate) fn suspicion(&self) -> f64 {
        self.suspicion.min(1.0)
    }

    /// Credibility score derived from accumulated suspicion
    pub(crate) fn credibility(&self) -> f64 {
        (1.0 - self.suspicion()) * 100.0
    }

    pub(crate) fn into_result(self, score: f64, confidence: Confidence) -> ModalityResult {
        ModalityResult::new(score, confidence, self.indicators, self.severe)
    }
}

/// Population mean
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
