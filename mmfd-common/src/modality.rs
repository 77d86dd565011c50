//! Modality data model
//!
//! One `ModalityResult` is produced per modality per analysis by a scorer and
//! consumed by the fusion engine. Sets are ordered so that serialized output
//! is deterministic.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Independent analysis channel
///
/// Ordering (Text < Audio < Video) is the canonical iteration order for
/// fusion, which keeps floating-point summation order fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
    Video,
}

impl Modality {
    /// All modalities in canonical order
    pub const ALL: [Modality; 3] = [Modality::Text, Modality::Audio, Modality::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Audio => "audio",
            Modality::Video => "video",
        }
    }

    /// Capitalized label used in human-readable explanations
    pub fn label(&self) -> &'static str {
        match self {
            Modality::Text => "Text",
            Modality::Audio => "Audio",
            Modality::Video => "Video",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "audio" => Ok(Modality::Audio),
            "video" => Ok(Modality::Video),
            other => Err(Error::InvalidInput(format!("Unknown modality: {}", other))),
        }
    }
}

/// Output of one per-modality scorer
///
/// `score` is credibility in [0, 100] (100 = fully credible), `confidence`
/// is in [0, 1]. Every severe indicator is also listed in `indicators`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityResult {
    pub score: f64,
    pub confidence: f64,
    #[serde(default)]
    pub indicators: BTreeSet<String>,
    #[serde(default)]
    pub severe_indicators: BTreeSet<String>,
}

impl ModalityResult {
    /// Build a result, clamping score/confidence into range and folding
    /// severe indicators into the indicator set.
    pub fn new(
        score: f64,
        confidence: f64,
        indicators: BTreeSet<String>,
        severe_indicators: BTreeSet<String>,
    ) -> Self {
        Self {
            score,
            confidence,
            indicators,
            severe_indicators,
        }
        .normalized()
    }

    /// Neutral result returned when an artifact carries no usable content
    pub fn neutral(min_confidence: f64) -> Self {
        Self::new(50.0, min_confidence, BTreeSet::new(), BTreeSet::new())
    }

    /// Re-establish the range and subset invariants.
    ///
    /// Results deserialized from callers go through this before fusion.
    /// Non-finite values collapse to the neutral point.
    pub fn normalized(mut self) -> Self {
        self.score = if self.score.is_finite() {
            self.score.clamp(0.0, 100.0)
        } else {
            50.0
        };
        self.confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        for severe in &self.severe_indicators {
            if !self.indicators.contains(severe) {
                self.indicators.insert(severe.clone());
            }
        }
        self
    }

    pub fn severe_count(&self) -> usize {
        self.severe_indicators.len()
    }
}

/// Final categorical classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Fake,
    Real,
    Uncertain,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Fake => write!(f, "FAKE"),
            Verdict::Real => write!(f, "REAL"),
            Verdict::Uncertain => write!(f, "UNCERTAIN"),
        }
    }
}

/// Human-readable confidence band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "Very High")]
    VeryHigh,
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceLevel::VeryHigh
        } else if confidence >= 0.6 {
            ConfidenceLevel::High
        } else if confidence >= 0.4 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::VeryHigh => write!(f, "Very High"),
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}

/// A user submission: which modalities are available for one analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub id: Uuid,
    pub available_modalities: BTreeSet<Modality>,
}

impl AnalysisRequest {
    pub fn new(available_modalities: impl IntoIterator<Item = Modality>) -> Self {
        Self {
            id: Uuid::new_v4(),
            available_modalities: available_modalities.into_iter().collect(),
        }
    }

    pub fn includes(&self, modality: Modality) -> bool {
        self.available_modalities.contains(&modality)
    }
}
