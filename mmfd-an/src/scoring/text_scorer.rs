// Text Scorer
//
// Linguistic manipulation signals (clickbait, urgency, emotional pressure,
// conspiracy framing) weighed against credibility markers and citations.
// Confidence: 0.35-0.65 (rule-based heuristics)

use crate::scoring::lexicon::{count_hits, normalize_text, PhraseCategory};
use crate::scoring::{ArtifactError, Confidence, Scorer, Signals};
use mmfd_common::{Modality, ModalityResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const MIN_CONFIDENCE: Confidence = 0.35;
const MAX_CONFIDENCE: Confidence = 0.65;

/// Characters of text handed to an injected classifier
const CLASSIFIER_INPUT_CHARS: usize = 2000;

const SHORT_TEXT_WORDS: usize = 20;
const CAPS_RATIO_THRESHOLD: f64 = 0.3;
const CAPS_RATIO_SEVERE: f64 = 0.5;
const ALL_CAPS_MIN_LEN: usize = 4;
const PUNCTUATION_THRESHOLD: usize = 3;
const PUNCTUATION_SEVERE: usize = 6;

/// Decoded text artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextArtifact {
    pub text: String,
}

impl TextArtifact {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Pretrained fake-news classifier handle
///
/// Constructed once at startup and shared read-only between requests.
pub trait TextClassifier: Send + Sync {
    /// Classifier name for logs
    fn name(&self) -> &str;

    /// Probability in [0, 1] that `text` is fake
    fn fake_probability(&self, text: &str) -> anyhow::Result<f64>;
}

/// Raw text signals before thresholding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextSignals {
    pub clickbait: usize,
    pub emotional: usize,
    pub urgency: usize,
    pub sensational: usize,
    pub conspiracy: usize,
    pub credibility: usize,
    pub citations: usize,
    /// Uppercase letters over all letters
    pub caps_ratio: f64,
    /// Words of 4+ letters written entirely in uppercase
    pub all_caps_words: usize,
    pub exclamations: usize,
    pub questions: usize,
    pub word_count: usize,
}

impl TextSignals {
    pub fn extract(text: &str) -> Self {
        let normalized = normalize_text(text);

        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        let uppercase = text.chars().filter(|c| c.is_uppercase()).count();
        let caps_ratio = if letters > 0 {
            uppercase as f64 / letters as f64
        } else {
            0.0
        };

        let all_caps_words = text
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|word| {
                word.chars().filter(|c| c.is_alphabetic()).count() >= ALL_CAPS_MIN_LEN
                    && word.chars().all(|c| !c.is_lowercase())
            })
            .count();

        Self {
            clickbait: count_hits(&normalized, PhraseCategory::Clickbait),
            emotional: count_hits(&normalized, PhraseCategory::Emotional),
            urgency: count_hits(&normalized, PhraseCategory::Urgency),
            sensational: count_hits(&normalized, PhraseCategory::Sensational),
            conspiracy: count_hits(&normalized, PhraseCategory::Conspiracy),
            credibility: count_hits(&normalized, PhraseCategory::Credibility),
            citations: count_hits(&normalized, PhraseCategory::Citation),
            caps_ratio,
            all_caps_words,
            exclamations: text.matches('!').count(),
            questions: text.matches('?').count(),
            word_count: text.split_whitespace().count(),
        }
    }

    fn has_excessive_caps(&self) -> bool {
        self.caps_ratio > CAPS_RATIO_THRESHOLD || self.all_caps_words > 0
    }

    fn has_excessive_punctuation(&self) -> bool {
        self.exclamations > PUNCTUATION_THRESHOLD || self.questions > PUNCTUATION_THRESHOLD
    }

    fn is_short(&self) -> bool {
        self.word_count < SHORT_TEXT_WORDS
    }

    /// Rule-based fake probability in [0.15, 0.85]
    pub fn fake_probability(&self) -> f64 {
        let mut p = 0.30;
        p += self.clickbait as f64 * 0.12;
        p += self.emotional as f64 * 0.08;
        p += self.urgency as f64 * 0.10;
        p += self.sensational as f64 * 0.04;
        p += self.conspiracy as f64 * 0.08;
        p -= self.credibility as f64 * 0.08;
        p -= self.citations as f64 * 0.06;
        if self.has_excessive_caps() {
            p += 0.05;
        }
        if self.has_excessive_punctuation() {
            p += 0.05;
        }
        if self.is_short() {
            p += 0.03;
        }
        p.clamp(0.15, 0.85)
    }

    fn indicator_hits(&self) -> usize {
        self.clickbait + self.emotional + self.urgency + self.credibility
    }
}

pub struct TextScorer {
    classifier: Option<Arc<dyn TextClassifier>>,
}

impl Default for TextScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextScorer {
    /// Rule-based scorer
    pub fn new() -> Self {
        Self { classifier: None }
    }

    /// Scorer that prefers `classifier` and falls back to rules on failure
    pub fn with_classifier(classifier: Arc<dyn TextClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    fn raise_indicators(signals: &TextSignals) -> Signals {
        let mut raised = Signals::default();
        let phrase_indicators = [
            ("clickbait_language", signals.clickbait, 3),
            ("emotional_manipulation", signals.emotional, 3),
            ("urgency_tactics", signals.urgency, 3),
            ("sensational_language", signals.sensational, 3),
            ("conspiracy_language", signals.conspiracy, 2),
        ];
        for (name, hits, severe_at) in phrase_indicators {
            if hits > 0 {
                raised.raise(name, hits >= severe_at, 0.0);
            }
        }
        if signals.has_excessive_caps() {
            raised.raise(
                "excessive_capitalization",
                signals.caps_ratio > CAPS_RATIO_SEVERE,
                0.0,
            );
        }
        if signals.has_excessive_punctuation() {
            raised.raise(
                "excessive_punctuation",
                signals.exclamations > PUNCTUATION_SEVERE || signals.questions > PUNCTUATION_SEVERE,
                0.0,
            );
        }
        raised
    }

    /// Classifier prediction, if a classifier is installed and succeeds
    fn classify(&self, text: &str) -> Option<f64> {
        let classifier = self.classifier.as_ref()?;
        let input: String = text.chars().take(CLASSIFIER_INPUT_CHARS).collect();
        match classifier.fake_probability(&input) {
            Ok(p) if p.is_finite() => Some(p.clamp(0.0, 1.0)),
            Ok(p) => {
                warn!(
                    "Classifier {} returned non-finite probability {}, using rules",
                    classifier.name(),
                    p
                );
                None
            }
            Err(e) => {
                warn!("Classifier {} failed, using rules: {}", classifier.name(), e);
                None
            }
        }
    }
}

impl Scorer for TextScorer {
    type Artifact = TextArtifact;

    fn modality(&self) -> Modality {
        Modality::Text
    }

    fn analyze(&self, artifact: &TextArtifact) -> Result<ModalityResult, ArtifactError> {
        let text = artifact.text.trim();
        if text.is_empty() {
            return Err(ArtifactError::Empty("text is empty".to_string()));
        }

        let signals = TextSignals::extract(text);
        let raised = Self::raise_indicators(&signals);

        let (score, confidence) = match self.classify(text) {
            Some(p) => {
                let mut score = (1.0 - p) * 100.0;
                if signals.credibility > 2 {
                    score += 5.0;
                }
                let mut confidence = (p - 0.5).abs() * 2.0;
                if signals.clickbait > 3 {
                    confidence += 0.10;
                }
                (score, confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE))
            }
            None => {
                let p = signals.fake_probability();
                let confidence = (MIN_CONFIDENCE
                    + 0.04 * signals.indicator_hits() as f64
                    + 0.02 * raised.severe_count() as f64)
                    .min(MAX_CONFIDENCE);
                ((1.0 - p) * 100.0, confidence)
            }
        };

        debug!(
            "Text signals: clickbait={}, emotional={}, urgency={}, credibility={}, caps={:.2}, words={} -> score={:.1}, confidence={:.2}",
            signals.clickbait,
            signals.emotional,
            signals.urgency,
            signals.credibility,
            signals.caps_ratio,
            signals.word_count,
            score,
            confidence
        );

        Ok(raised.into_result(score, confidence))
    }

    fn confidence_range(&self) -> (Confidence, Confidence) {
        (MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}
