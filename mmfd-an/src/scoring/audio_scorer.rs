// Audio Scorer
//
// Spectral and level statistics that separate recorded speech from
// synthesized or heavily processed audio.
// Confidence: 0.60-0.90 (signal statistics)

use crate::scoring::{mean, std_dev, ArtifactError, Confidence, Scorer, Signals};
use mmfd_common::{Modality, ModalityResult};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MIN_CONFIDENCE: Confidence = 0.60;
const MAX_CONFIDENCE: Confidence = 0.90;

/// Analysis frame length in samples
pub const FRAME_SIZE: usize = 2048;
/// Hop between analysis frames in samples
pub const HOP_SIZE: usize = 512;

/// Frames needed before centroid variation is meaningful
const MIN_FRAMES_FOR_VARIATION: usize = 4;
const CLIP_LEVEL: f64 = 0.99;
const QUIET_LEVEL: f64 = 0.1;

/// Decoded mono PCM audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioArtifact {
    /// Samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioArtifact {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }
}

/// Measured audio features
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFeatures {
    /// Mean spectral centroid over non-silent frames (Hz)
    pub centroid_mean: Option<f64>,
    /// Coefficient of variation of the spectral centroid
    pub centroid_cv: Option<f64>,
    pub zcr_mean: f64,
    pub clipping_ratio: f64,
    pub snr_db: Option<f64>,
    pub dynamic_range_db: Option<f64>,
    pub duration_seconds: f64,
}

impl AudioFeatures {
    pub fn extract(samples: &[f64], sample_rate: u32) -> Self {
        let centroids = frame_spectral_centroids(samples, sample_rate);
        let centroid_mean = if centroids.is_empty() {
            None
        } else {
            Some(mean(&centroids))
        };
        let centroid_cv = centroid_mean
            .filter(|m| *m > 0.0 && centroids.len() >= MIN_FRAMES_FOR_VARIATION)
            .map(|m| std_dev(&centroids) / m);

        let zcrs: Vec<f64> = frames(samples).map(calculate_zero_crossing_rate).collect();

        Self {
            centroid_mean,
            centroid_cv,
            zcr_mean: mean(&zcrs),
            clipping_ratio: calculate_clipping_ratio(samples),
            snr_db: calculate_snr_db(samples),
            dynamic_range_db: calculate_dynamic_range_db(samples),
            duration_seconds: samples.len() as f64 / sample_rate as f64,
        }
    }
}

pub struct AudioScorer;

impl Default for AudioScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioScorer {
    pub fn new() -> Self {
        Self
    }

    fn raise_indicators(features: &AudioFeatures) -> Signals {
        let mut raised = Signals::default();

        if let Some(centroid) = features.centroid_mean {
            if !(250.0..=3500.0).contains(&centroid) {
                raised.raise("spectral_centroid_anomaly", true, 0.20);
            } else if !(300.0..=3000.0).contains(&centroid) {
                raised.raise("spectral_centroid_anomaly", false, 0.12);
            }
        }

        if features.centroid_cv.is_some_and(|cv| cv < 0.05) {
            raised.raise("flat_spectral_centroid", false, 0.10);
        }

        let zcr = features.zcr_mean;
        if !(0.003..=0.4).contains(&zcr) {
            raised.raise("zero_crossing_anomaly", true, 0.18);
        } else if !(0.005..=0.3).contains(&zcr) {
            raised.raise("zero_crossing_anomaly", false, 0.10);
        }

        if features.clipping_ratio > 0.05 {
            raised.raise("audio_clipping", true, 0.15);
        } else if features.clipping_ratio > 0.01 {
            raised.raise("audio_clipping", false, 0.10);
        }

        if let Some(snr) = features.snr_db {
            if snr < 8.0 {
                raised.raise("low_snr", true, 0.15);
            } else if snr < 10.0 {
                raised.raise("low_snr", false, 0.08);
            } else if snr > 55.0 {
                raised.raise("synthetic_snr", true, 0.18);
            } else if snr > 50.0 {
                raised.raise("synthetic_snr", false, 0.12);
            }
        }

        if let Some(range) = features.dynamic_range_db {
            if range < 8.0 {
                raised.raise("low_dynamic_range", true, 0.12);
            } else if range < 10.0 {
                raised.raise("low_dynamic_range", false, 0.08);
            }
        }

        raised
    }
}

impl Scorer for AudioScorer {
    type Artifact = AudioArtifact;

    fn modality(&self) -> Modality {
        Modality::Audio
    }

    fn analyze(&self, artifact: &AudioArtifact) -> Result<ModalityResult, ArtifactError> {
        if artifact.sample_rate == 0 {
            return Err(ArtifactError::Malformed("sample rate is zero".to_string()));
        }

        let samples: Vec<f64> = artifact
            .samples
            .iter()
            .filter(|s| s.is_finite())
            .map(|&s| s as f64)
            .collect();
        if samples.is_empty() {
            return Err(ArtifactError::Empty("no finite samples".to_string()));
        }
        if samples.iter().all(|s| *s == 0.0) {
            return Err(ArtifactError::Empty("digital silence".to_string()));
        }

        let features = AudioFeatures::extract(&samples, artifact.sample_rate);
        let raised = Self::raise_indicators(&features);

        let score = raised.credibility();
        let confidence = (MIN_CONFIDENCE + 0.06 * raised.count() as f64).min(MAX_CONFIDENCE);

        debug!(
            "Audio features: {:.2}s, centroid={:?}, cv={:?}, ZCR={:.4}, clipping={:.4}, SNR={:?}, range={:?} -> score={:.1}",
            features.duration_seconds,
            features.centroid_mean,
            features.centroid_cv,
            features.zcr_mean,
            features.clipping_ratio,
            features.snr_db,
            features.dynamic_range_db,
            score
        );

        Ok(raised.into_result(score, confidence))
    }

    fn confidence_range(&self) -> (Confidence, Confidence) {
        (MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

/// Analysis frames; a signal shorter than one frame is a single frame
fn frames(samples: &[f64]) -> impl Iterator<Item = &[f64]> {
    let starts: Vec<usize> = if samples.len() <= FRAME_SIZE {
        vec![0]
    } else {
        (0..=samples.len() - FRAME_SIZE).step_by(HOP_SIZE).collect()
    };
    starts
        .into_iter()
        .map(move |start| &samples[start..(start + FRAME_SIZE).min(samples.len())])
}

/// Spectral centroid of each non-silent Hann-windowed frame (Hz)
fn frame_spectral_centroids(samples: &[f64], sample_rate: u32) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }

    let window_len = samples.len().min(FRAME_SIZE);
    let fft_size = window_len.next_power_of_two();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    let bin_hz = sample_rate as f64 / fft_size as f64;

    let mut centroids = Vec::new();
    for frame in frames(samples) {
        let n = frame.len();
        let mut buffer: Vec<Complex<f64>> = frame
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let window = 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos());
                Complex::new(x * window, 0.0)
            })
            .collect();
        buffer.resize(fft_size, Complex::new(0.0, 0.0));

        fft.process(&mut buffer);

        let mut weighted = 0.0;
        let mut total = 0.0;
        for (bin, value) in buffer.iter().take(fft_size / 2 + 1).enumerate() {
            let magnitude = value.norm();
            weighted += bin as f64 * bin_hz * magnitude;
            total += magnitude;
        }
        if total > 1e-12 {
            centroids.push(weighted / total);
        }
    }
    centroids
}

/// Calculate Zero-Crossing Rate
fn calculate_zero_crossing_rate(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();

    crossings as f64 / samples.len() as f64
}

fn calculate_clipping_ratio(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let clipped = samples.iter().filter(|s| s.abs() > CLIP_LEVEL).count();
    clipped as f64 / samples.len() as f64
}

/// Signal power over the variance of quiet samples, in dB
///
/// None when too few quiet samples exist to estimate a noise floor.
fn calculate_snr_db(samples: &[f64]) -> Option<f64> {
    let power = samples.iter().map(|s| s * s).sum::<f64>() / samples.len().max(1) as f64;
    let quiet: Vec<f64> = samples
        .iter()
        .copied()
        .filter(|s| s.abs() < QUIET_LEVEL)
        .collect();
    if quiet.len() < 2 || power <= 0.0 {
        return None;
    }
    let noise = std_dev(&quiet).powi(2);
    Some(10.0 * (power / (noise + 1e-10)).log10())
}

/// Peak over smallest non-zero magnitude, in dB
fn calculate_dynamic_range_db(samples: &[f64]) -> Option<f64> {
    let peak = samples.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));
    let floor = samples
        .iter()
        .map(|s| s.abs())
        .filter(|s| *s > 0.0)
        .fold(f64::INFINITY, f64::min);
    if peak <= 0.0 || !floor.is_finite() {
        return None;
    }
    Some(20.0 * (peak / (floor + 1e-10)).log10())
}
