// Base score and confidence per fusion strategy, before agreement and
// severe-indicator adjustments

use mmfd_common::config::FusionStrategy;
use mmfd_common::{Modality, ModalityResult};
use std::collections::BTreeMap;

/// Score above which a modality votes "credible"
const VOTE_THRESHOLD: f64 = 50.0;
const VOTE_REAL_SCORE: f64 = 75.0;
const VOTE_FAKE_SCORE: f64 = 25.0;
const VOTE_TIE_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseFusion {
    pub score: f64,
    pub confidence: f64,
}

/// Combine non-empty `results` with `strategy`
///
/// `weights` must hold a weight for every modality in `results`. A lone
/// modality passes through unchanged whatever the strategy.
pub fn combine(
    strategy: FusionStrategy,
    results: &BTreeMap<Modality, ModalityResult>,
    weights: &BTreeMap<Modality, f64>,
) -> BaseFusion {
    if let (1, Some(only)) = (results.len(), results.values().next()) {
        return BaseFusion {
            score: only.score,
            confidence: only.confidence,
        };
    }

    match strategy {
        FusionStrategy::WeightedAverage => weighted_average(results, weights),
        FusionStrategy::Maximum => extreme(results, |candidate, best| candidate > best),
        FusionStrategy::Minimum => extreme(results, |candidate, best| candidate < best),
        FusionStrategy::Voting => voting(results),
    }
}

fn weighted_average(
    results: &BTreeMap<Modality, ModalityResult>,
    weights: &BTreeMap<Modality, f64>,
) -> BaseFusion {
    let mut score = 0.0;
    let mut confidence = 0.0;
    for (modality, result) in results {
        let weight = weights.get(modality).copied().unwrap_or(0.0);
        score += weight * result.score;
        confidence += weight * result.confidence;
    }
    BaseFusion { score, confidence }
}

/// Score and confidence of the modality preferred by `better`; ties keep
/// the earlier modality
fn extreme(
    results: &BTreeMap<Modality, ModalityResult>,
    better: impl Fn(f64, f64) -> bool,
) -> BaseFusion {
    let mut chosen: Option<&ModalityResult> = None;
    for result in results.values() {
        match chosen {
            Some(best) if !better(result.score, best.score) => {}
            _ => chosen = Some(result),
        }
    }
    chosen
        .map(|result| BaseFusion {
            score: result.score,
            confidence: result.confidence,
        })
        .unwrap_or(BaseFusion {
            score: VOTE_TIE_SCORE,
            confidence: 0.0,
        })
}

fn voting(results: &BTreeMap<Modality, ModalityResult>) -> BaseFusion {
    let real_votes = results
        .values()
        .filter(|r| r.score > VOTE_THRESHOLD)
        .count();
    let fake_votes = results.len() - real_votes;

    let score = if real_votes > fake_votes {
        VOTE_REAL_SCORE
    } else if fake_votes > real_votes {
        VOTE_FAKE_SCORE
    } else {
        VOTE_TIE_SCORE
    };
    let confidence = if results.is_empty() {
        0.0
    } else {
        results.values().map(|r| r.confidence).sum::<f64>() / results.len() as f64
    };
    BaseFusion { score, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::weights;
    use mmfd_common::config::ModalityWeights;
    use std::collections::BTreeSet;

    fn results(entries: &[(Modality, f64, f64)]) -> BTreeMap<Modality, ModalityResult> {
        entries
            .iter()
            .map(|&(modality, score, confidence)| {
                (
                    modality,
                    ModalityResult::new(score, confidence, BTreeSet::new(), BTreeSet::new()),
                )
            })
            .collect()
    }

    fn run(strategy: FusionStrategy, input: &BTreeMap<Modality, ModalityResult>) -> BaseFusion {
        let weights = weights::normalize(&ModalityWeights::default(), input.keys().copied());
        combine(strategy, input, &weights)
    }

    #[test]
    fn test_weighted_average() {
        let input = results(&[
            (Modality::Text, 20.0, 0.6),
            (Modality::Audio, 25.0, 0.8),
            (Modality::Video, 22.0, 0.7),
        ]);
        let base = run(FusionStrategy::WeightedAverage, &input);
        assert!((base.score - 22.0).abs() < 1e-9);
        assert!((base.confidence - 0.685).abs() < 1e-9);
    }

    #[test]
    fn test_maximum_and_minimum() {
        let input = results(&[
            (Modality::Text, 20.0, 0.6),
            (Modality::Audio, 80.0, 0.9),
            (Modality::Video, 50.0, 0.7),
        ]);
        assert_eq!(
            run(FusionStrategy::Maximum, &input),
            BaseFusion {
                score: 80.0,
                confidence: 0.9
            }
        );
        assert_eq!(
            run(FusionStrategy::Minimum, &input),
            BaseFusion {
                score: 20.0,
                confidence: 0.6
            }
        );
    }

    #[test]
    fn test_extreme_ties_keep_modality_order() {
        let input = results(&[
            (Modality::Text, 60.0, 0.4),
            (Modality::Video, 60.0, 0.8),
        ]);
        assert_eq!(run(FusionStrategy::Maximum, &input).confidence, 0.4);
        assert_eq!(run(FusionStrategy::Minimum, &input).confidence, 0.4);
    }

    #[test]
    fn test_voting_majority() {
        let input = results(&[
            (Modality::Text, 80.0, 0.6),
            (Modality::Audio, 70.0, 0.8),
            (Modality::Video, 10.0, 0.7),
        ]);
        let base = run(FusionStrategy::Voting, &input);
        assert_eq!(base.score, 75.0);
        assert!((base.confidence - 0.7).abs() < 1e-9);

        let input = results(&[(Modality::Text, 50.0, 0.5), (Modality::Audio, 20.0, 0.5)]);
        assert_eq!(run(FusionStrategy::Voting, &input).score, 25.0);
    }

    #[test]
    fn test_voting_tie() {
        let input = results(&[(Modality::Text, 90.0, 0.5), (Modality::Audio, 10.0, 0.5)]);
        assert_eq!(run(FusionStrategy::Voting, &input).score, 50.0);
    }

    #[test]
    fn test_single_modality_passthrough() {
        let input = results(&[(Modality::Video, 37.5, 0.62)]);
        for strategy in FusionStrategy::ALL {
            let base = run(strategy, &input);
            assert_eq!(base.score, 37.5, "strategy {}", strategy);
            assert_eq!(base.confidence, 0.62, "strategy {}", strategy);
        }
    }

    #[test]
    fn test_lone_vote_keeps_its_score() {
        let input = results(&[(Modality::Audio, 55.0, 0.7)]);
        assert_eq!(
            run(FusionStrategy::Voting, &input),
            BaseFusion {
                score: 55.0,
                confidence: 0.7
            }
        );
    }
}
