// Cross-modal agreement
//
// Modalities that agree raise confidence, modalities that contradict each
// other lower it. Only meaningful with two or more modalities.

use crate::scoring::std_dev;
use mmfd_common::config::AgreementConfig;
use serde::Serialize;

/// Agreement between modality scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    /// Population standard deviation of the modality scores
    pub spread: f64,
    /// Confidence change actually applied
    pub adjustment: f64,
}

impl Agreement {
    pub fn describe(&self, config: &AgreementConfig) -> &'static str {
        if self.spread <= config.low_spread {
            "modalities agree"
        } else if self.spread >= config.high_spread {
            "modalities disagree"
        } else {
            "modalities partially agree"
        }
    }
}

/// Intended confidence change for `spread`, before ceiling/floor limits
pub fn raw_adjustment(spread: f64, config: &AgreementConfig) -> f64 {
    if spread <= config.low_spread {
        config.bonus
    } else if spread >= config.high_spread {
        -config.penalty
    } else {
        let t = (spread - config.low_spread) / (config.high_spread - config.low_spread);
        config.bonus - t * (config.bonus + config.penalty)
    }
}

/// Apply agreement to `confidence`
///
/// Returns the adjusted confidence and the agreement note, or the input
/// unchanged and None with fewer than two scores. A bonus never lifts
/// confidence above the ceiling and a penalty never drops it below the
/// floor; confidence already beyond either limit is left alone.
pub fn apply(
    scores: &[f64],
    confidence: f64,
    config: &AgreementConfig,
) -> (f64, Option<Agreement>) {
    if scores.len() < 2 {
        return (confidence, None);
    }

    let spread = std_dev(scores);
    let raw = raw_adjustment(spread, config);
    let adjusted = if raw > 0.0 {
        if confidence >= config.bonus_ceiling {
            confidence
        } else {
            (confidence + raw).min(config.bonus_ceiling)
        }
    } else if raw < 0.0 {
        if confidence <= config.penalty_floor {
            confidence
        } else {
            (confidence + raw).max(config.penalty_floor)
        }
    } else {
        confidence
    };

    (
        adjusted,
        Some(Agreement {
            spread,
            adjustment: adjusted - confidence,
        }),
    )
}
