// Video Scorer
//
// Frame statistics (face consistency, edge artifacts around faces,
// sharpness, sensor noise, lighting and cut rate) that expose spliced or
// synthesized footage.
// Confidence: 0.55-0.85 (frame statistics)

use crate::scoring::{mean, std_dev, ArtifactError, Confidence, Scorer, Signals};
use mmfd_common::{Modality, ModalityResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const MIN_CONFIDENCE: Confidence = 0.55;
const MAX_CONFIDENCE: Confidence = 0.85;

const SOBEL_EDGE_THRESHOLD: f64 = 100.0;
const EDGE_DENSITY_THRESHOLD: f64 = 0.2;
const BLURRY_FRAME_VARIANCE: f64 = 10.0;
const SCENE_CUT_DIFFERENCE: f64 = 30.0;
const SUSPICIOUS_FRAME_WEIGHT: f64 = 0.05;

/// Face bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Box clipped to a `width` x `height` frame, None if nothing remains
    fn clipped(&self, width: u32, height: u32) -> Option<FaceBox> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let clipped = FaceBox {
            x: self.x,
            y: self.y,
            width: self.width.min(width - self.x),
            height: self.height.min(height - self.y),
        };
        (clipped.width > 0 && clipped.height > 0).then_some(clipped)
    }
}

/// One decoded grayscale frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major 8-bit luma, `width * height` bytes
    pub luma: Vec<u8>,
    /// Face boxes attached by the decoder, if it ran detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faces: Option<Vec<FaceBox>>,
}

impl Frame {
    pub fn new(width: u32, height: u32, luma: Vec<u8>) -> Self {
        Self {
            width,
            height,
            luma,
            faces: None,
        }
    }

    pub fn with_faces(mut self, faces: Vec<FaceBox>) -> Self {
        self.faces = Some(faces);
        self
    }

    fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.luma.len() as u64 == self.width as u64 * self.height as u64
    }

    fn at(&self, x: usize, y: usize) -> f64 {
        self.luma[y * self.width as usize + x] as f64
    }
}

/// Decoded video: sampled frames and their capture rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub frames: Vec<Frame>,
    pub fps: f64,
}

/// Face detection handle
///
/// Constructed once at startup and shared read-only between requests.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Vec<FaceBox>;
}

/// Detector that trusts the boxes attached to each frame
#[derive(Debug, Default, Clone, Copy)]
pub struct ProvidedFaces;

impl FaceDetector for ProvidedFaces {
    fn detect(&self, frame: &Frame) -> Vec<FaceBox> {
        frame.faces.clone().unwrap_or_default()
    }
}

/// Per-frame measurements
#[derive(Debug, Clone, PartialEq)]
struct FrameStats {
    brightness: f64,
    sharpness: f64,
    noise: f64,
    faces: Vec<FaceBox>,
    edge_artifacts: bool,
}

impl FrameStats {
    fn suspicious(&self) -> bool {
        self.edge_artifacts || self.sharpness < BLURRY_FRAME_VARIANCE
    }
}

/// Aggregated video features
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFeatures {
    pub frames_analyzed: usize,
    pub face_count_std: f64,
    /// Coefficient of variation of face areas; None with fewer than two faces
    pub face_size_cv: Option<f64>,
    /// Fraction of frames with edge artifacts inside a face box
    pub edge_artifact_ratio: f64,
    pub sharpness_mean: f64,
    pub noise_mean: f64,
    /// Std of per-frame mean brightness; None with a single frame
    pub brightness_std: Option<f64>,
    /// Scene cuts per second; None without a usable frame rate
    pub scene_cuts_per_second: Option<f64>,
    pub suspicious_frames: usize,
}

pub struct VideoScorer {
    detector: Arc<dyn FaceDetector>,
}

impl Default for VideoScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoScorer {
    /// Scorer using the decoder-provided face boxes
    pub fn new() -> Self {
        Self::with_detector(Arc::new(ProvidedFaces))
    }

    pub fn with_detector(detector: Arc<dyn FaceDetector>) -> Self {
        Self { detector }
    }

    fn frame_stats(&self, frame: &Frame) -> FrameStats {
        let faces: Vec<FaceBox> = self
            .detector
            .detect(frame)
            .iter()
            .filter_map(|face| face.clipped(frame.width, frame.height))
            .collect();
        let edge_artifacts = faces
            .iter()
            .any(|face| edge_density(frame, face) > EDGE_DENSITY_THRESHOLD);

        FrameStats {
            brightness: frame.luma.iter().map(|&v| v as f64).sum::<f64>() / frame.luma.len() as f64,
            sharpness: laplacian_variance(frame),
            noise: noise_level(frame),
            faces,
            edge_artifacts,
        }
    }

    pub fn extract_features(&self, frames: &[&Frame], fps: f64) -> VideoFeatures {
        let stats: Vec<FrameStats> = frames.iter().map(|f| self.frame_stats(f)).collect();

        let face_counts: Vec<f64> = stats.iter().map(|s| s.faces.len() as f64).collect();
        let face_areas: Vec<f64> = stats
            .iter()
            .flat_map(|s| s.faces.iter().map(|f| f.area() as f64))
            .collect();
        let face_size_cv = if face_areas.len() >= 2 {
            let m = mean(&face_areas);
            (m > 0.0).then(|| std_dev(&face_areas) / m)
        } else {
            None
        };

        let brightness: Vec<f64> = stats.iter().map(|s| s.brightness).collect();
        let edge_frames = stats.iter().filter(|s| s.edge_artifacts).count();

        let scene_cuts_per_second = if fps.is_finite() && fps > 0.0 && frames.len() >= 2 {
            let cuts = frames
                .windows(2)
                .filter(|pair| {
                    mean_abs_difference(pair[0], pair[1])
                        .is_some_and(|diff| diff > SCENE_CUT_DIFFERENCE)
                })
                .count();
            Some(cuts as f64 / (frames.len() as f64 / fps))
        } else {
            None
        };

        VideoFeatures {
            frames_analyzed: frames.len(),
            face_count_std: std_dev(&face_counts),
            face_size_cv,
            edge_artifact_ratio: edge_frames as f64 / frames.len().max(1) as f64,
            sharpness_mean: mean(&stats.iter().map(|s| s.sharpness).collect::<Vec<_>>()),
            noise_mean: mean(&stats.iter().map(|s| s.noise).collect::<Vec<_>>()),
            brightness_std: (brightness.len() >= 2).then(|| std_dev(&brightness)),
            scene_cuts_per_second,
            suspicious_frames: stats.iter().filter(|s| s.suspicious()).count(),
        }
    }

    fn raise_indicators(features: &VideoFeatures) -> Signals {
        let mut raised = Signals::default();

        if features.face_count_std > 3.0 {
            raised.raise("inconsistent_face_count", true, 0.20);
        } else if features.face_count_std > 1.5 {
            raised.raise("inconsistent_face_count", false, 0.15);
        }

        if let Some(cv) = features.face_size_cv {
            if cv > 1.0 {
                raised.raise("face_size_variation", true, 0.20);
            } else if cv > 0.5 {
                raised.raise("face_size_variation", false, 0.15);
            }
        }

        if features.edge_artifact_ratio > 0.6 {
            raised.raise("face_edge_artifacts", true, 0.25);
        } else if features.edge_artifact_ratio > 0.3 {
            raised.raise("face_edge_artifacts", false, 0.20);
        }

        if features.sharpness_mean < 10.0 {
            raised.raise("low_sharpness", true, 0.15);
        } else if features.sharpness_mean < 30.0 {
            raised.raise("low_sharpness", false, 0.10);
        }

        if features.noise_mean > 35.0 {
            raised.raise("high_noise", true, 0.15);
        } else if features.noise_mean > 20.0 {
            raised.raise("high_noise", false, 0.10);
        }

        if features.brightness_std.is_some_and(|std| std < 2.0) {
            raised.raise("uniform_lighting", false, 0.10);
        }

        if let Some(rate) = features.scene_cuts_per_second {
            if rate > 10.0 {
                raised.raise("rapid_scene_cuts", true, 0.20);
            } else if rate > 5.0 {
                raised.raise("rapid_scene_cuts", false, 0.15);
            }
        }

        raised.add_suspicion(features.suspicious_frames as f64 * SUSPICIOUS_FRAME_WEIGHT);
        raised
    }
}

impl Scorer for VideoScorer {
    type Artifact = VideoArtifact;

    fn modality(&self) -> Modality {
        Modality::Video
    }

    fn analyze(&self, artifact: &VideoArtifact) -> Result<ModalityResult, ArtifactError> {
        if artifact.frames.is_empty() {
            return Err(ArtifactError::Empty("no frames".to_string()));
        }

        let frames: Vec<&Frame> = artifact.frames.iter().filter(|f| f.is_consistent()).collect();
        if frames.len() < artifact.frames.len() {
            debug!(
                "Skipping {} frames with inconsistent dimensions",
                artifact.frames.len() - frames.len()
            );
        }
        if frames.is_empty() {
            return Err(ArtifactError::Malformed(
                "no frame has luma matching its dimensions".to_string(),
            ));
        }

        let features = self.extract_features(&frames, artifact.fps);
        let raised = Self::raise_indicators(&features);

        let score = raised.credibility();
        let mut confidence = MIN_CONFIDENCE + 0.05 * raised.count() as f64;
        if raised.contains("face_edge_artifacts") {
            confidence += 0.10;
        }
        let confidence = confidence.min(MAX_CONFIDENCE);

        debug!(
            "Video features: frames={}, face_std={:.2}, edge_ratio={:.2}, sharpness={:.1}, noise={:.1}, cuts/s={:?}, suspicious={} -> score={:.1}",
            features.frames_analyzed,
            features.face_count_std,
            features.edge_artifact_ratio,
            features.sharpness_mean,
            features.noise_mean,
            features.scene_cuts_per_second,
            features.suspicious_frames,
            score
        );

        Ok(raised.into_result(score, confidence))
    }

    fn confidence_range(&self) -> (Confidence, Confidence) {
        (MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

/// Variance of the 4-neighbour Laplacian over interior pixels
fn laplacian_variance(frame: &Frame) -> f64 {
    let (w, h) = (frame.width as usize, frame.height as usize);
    if w < 3 || h < 3 {
        return 0.0;
    }
    let mut responses = Vec::with_capacity((w - 2) * (h - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let lap = frame.at(x - 1, y) + frame.at(x + 1, y) + frame.at(x, y - 1)
                + frame.at(x, y + 1)
                - 4.0 * frame.at(x, y);
            responses.push(lap);
        }
    }
    std_dev(&responses).powi(2)
}

/// Std of the frame minus its 3x3 Gaussian blur, over interior pixels
fn noise_level(frame: &Frame) -> f64 {
    const KERNEL: [[f64; 3]; 3] = [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]];

    let (w, h) = (frame.width as usize, frame.height as usize);
    if w < 3 || h < 3 {
        return 0.0;
    }
    let mut residuals = Vec::with_capacity((w - 2) * (h - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut blurred = 0.0;
            for (dy, row) in KERNEL.iter().enumerate() {
                for (dx, k) in row.iter().enumerate() {
                    blurred += k * frame.at(x + dx - 1, y + dy - 1);
                }
            }
            residuals.push(frame.at(x, y) - blurred / 16.0);
        }
    }
    std_dev(&residuals)
}

/// Fraction of interior pixels in `face` whose Sobel magnitude exceeds the edge threshold
fn edge_density(frame: &Frame, face: &FaceBox) -> f64 {
    let (w, h) = (frame.width as usize, frame.height as usize);
    let x0 = (face.x as usize).max(1);
    let y0 = (face.y as usize).max(1);
    let x1 = ((face.x + face.width) as usize).min(w.saturating_sub(1));
    let y1 = ((face.y + face.height) as usize).min(h.saturating_sub(1));
    if x0 >= x1 || y0 >= y1 {
        return 0.0;
    }

    let mut edges = 0usize;
    let mut total = 0usize;
    for y in y0..y1 {
        for x in x0..x1 {
            let gx = (frame.at(x + 1, y - 1) + 2.0 * frame.at(x + 1, y) + frame.at(x + 1, y + 1))
                - (frame.at(x - 1, y - 1) + 2.0 * frame.at(x - 1, y) + frame.at(x - 1, y + 1));
            let gy = (frame.at(x - 1, y + 1) + 2.0 * frame.at(x, y + 1) + frame.at(x + 1, y + 1))
                - (frame.at(x - 1, y - 1) + 2.0 * frame.at(x, y - 1) + frame.at(x + 1, y - 1));
            if (gx * gx + gy * gy).sqrt() > SOBEL_EDGE_THRESHOLD {
                edges += 1;
            }
            total += 1;
        }
    }
    edges as f64 / total as f64
}

/// Mean absolute luma difference; None when dimensions differ
fn mean_abs_difference(a: &Frame, b: &Frame) -> Option<f64> {
    if a.width != b.width || a.height != b.height {
        return None;
    }
    let sum: f64 = a
        .luma
        .iter()
        .zip(&b.luma)
        .map(|(&p, &q)| (p as f64 - q as f64).abs())
        .sum();
    Some(sum / a.luma.len() as f64)
}
