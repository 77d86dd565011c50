//! Fusion engine behaviour over realistic per-modality results
//!
//! Covers the end-to-end scenarios: agreeing fake signals, single-modality
//! pass-through, missing input, order independence and the agreement
//! property.

use mmfd_an::fusion::{FusionEngine, FusionError};
use mmfd_an::scoring::{Scorer, TextArtifact, TextScorer};
use mmfd_common::config::{FusionConfig, FusionStrategy};
use mmfd_common::{Modality, ModalityResult, Verdict};
use std::collections::{BTreeMap, BTreeSet};

fn result(score: f64, confidence: f64) -> ModalityResult {
    ModalityResult::new(score, confidence, BTreeSet::new(), BTreeSet::new())
}

fn results(entries: &[(Modality, f64, f64)]) -> BTreeMap<Modality, ModalityResult> {
    entries
        .iter()
        .map(|&(modality, score, confidence)| (modality, result(score, confidence)))
        .collect()
}

#[test]
fn test_agreeing_fake_signals() {
    let engine = FusionEngine::default();
    let input = results(&[
        (Modality::Text, 20.0, 0.6),
        (Modality::Audio, 25.0, 0.8),
        (Modality::Video, 22.0, 0.7),
    ]);

    let fused = engine.fuse(&input).unwrap();
    assert_eq!(fused.verdict, Verdict::Fake);
    assert!((fused.final_score - 22.0).abs() < 1e-9);
    // Base weighted confidence is 0.685; low spread adds the agreement bonus
    assert!(fused.confidence > 0.685);
    assert!((fused.confidence - 0.785).abs() < 1e-9);
    let agreement = fused.agreement.unwrap();
    assert!(agreement.spread < 15.0);
}

#[test]
fn test_single_modality_passes_through() {
    let engine = FusionEngine::default();
    let input = results(&[(Modality::Text, 64.2, 0.5)]);

    let fused = engine.fuse(&input).unwrap();
    assert_eq!(fused.final_score, 64.2);
    assert_eq!(fused.confidence, 0.5);
    assert_eq!(fused.verdict, Verdict::Uncertain);
    assert!(fused.agreement.is_none());
    assert_eq!(fused.weights_used.len(), 1);
    assert_eq!(fused.weights_used[&Modality::Text], 1.0);

    for strategy in FusionStrategy::ALL {
        let fused = engine.fuse_with(strategy, &input).unwrap();
        assert_eq!(fused.final_score, 64.2, "strategy {}", strategy);
        assert_eq!(fused.confidence, 0.5, "strategy {}", strategy);
    }
}

#[test]
fn test_no_modalities_is_insufficient_input() {
    let engine = FusionEngine::default();
    for strategy in FusionStrategy::ALL {
        assert_eq!(
            engine.fuse_with(strategy, &BTreeMap::new()),
            Err(FusionError::InsufficientInput)
        );
    }
}

#[test]
fn test_insertion_order_does_not_matter() {
    let engine = FusionEngine::default();
    let entries = [
        (Modality::Video, 81.0, 0.66),
        (Modality::Text, 35.5, 0.41),
        (Modality::Audio, 58.25, 0.77),
    ];

    let mut forward = BTreeMap::new();
    for &(modality, score, confidence) in &entries {
        forward.insert(modality, result(score, confidence));
    }
    let mut backward = BTreeMap::new();
    for &(modality, score, confidence) in entries.iter().rev() {
        backward.insert(modality, result(score, confidence));
    }

    for strategy in FusionStrategy::ALL {
        let a = engine.fuse_with(strategy, &forward).unwrap();
        let b = engine.fuse_with(strategy, &backward).unwrap();
        assert_eq!(a, b, "strategy {}", strategy);
    }
}

#[test]
fn test_agreement_raises_disagreement_lowers() {
    let engine = FusionEngine::default();
    let agreeing = results(&[
        (Modality::Text, 70.0, 0.6),
        (Modality::Audio, 70.0, 0.6),
        (Modality::Video, 70.0, 0.6),
    ]);
    let disagreeing = results(&[
        (Modality::Text, 10.0, 0.6),
        (Modality::Audio, 50.0, 0.6),
        (Modality::Video, 90.0, 0.6),
    ]);

    for strategy in FusionStrategy::ALL {
        let high = engine.fuse_with(strategy, &agreeing).unwrap();
        let low = engine.fuse_with(strategy, &disagreeing).unwrap();
        assert!(
            high.confidence >= low.confidence,
            "strategy {}: {} < {}",
            strategy,
            high.confidence,
            low.confidence
        );
    }
}

#[test]
fn test_fusion_is_idempotent() {
    let engine = FusionEngine::default();
    let mut input = results(&[(Modality::Text, 31.0, 0.52), (Modality::Video, 44.0, 0.7)]);
    let severe: BTreeSet<String> = ["audio_clipping".to_string()].into_iter().collect();
    input.insert(
        Modality::Audio,
        ModalityResult::new(12.0, 0.84, severe.clone(), severe),
    );

    let first = engine.fuse(&input).unwrap();
    let second = engine.fuse(&input).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_weights_used_sum_to_one() {
    let engine = FusionEngine::default();
    let subsets: [&[Modality]; 4] = [
        &[Modality::Text, Modality::Audio, Modality::Video],
        &[Modality::Text, Modality::Video],
        &[Modality::Audio, Modality::Video],
        &[Modality::Audio],
    ];
    for subset in subsets {
        let input: BTreeMap<_, _> = subset.iter().map(|m| (*m, result(50.0, 0.5))).collect();
        let fused = engine.fuse(&input).unwrap();
        let total: f64 = fused.weights_used.values().sum();
        assert!((total - 1.0).abs() < 1e-9, "subset {:?}", subset);
    }
}

#[test]
fn test_results_stay_in_range() {
    let engine = FusionEngine::default();
    let severe: BTreeSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let input: BTreeMap<_, _> = Modality::ALL
        .iter()
        .map(|m| (*m, ModalityResult::new(0.0, 0.9, severe.clone(), severe.clone())))
        .collect();

    for strategy in FusionStrategy::ALL {
        let fused = engine.fuse_with(strategy, &input).unwrap();
        assert!((0.0..=100.0).contains(&fused.final_score));
        assert!((0.0..=1.0).contains(&fused.confidence));
    }
}

#[test]
fn test_strategies_differ() {
    let engine = FusionEngine::default();
    let input = results(&[
        (Modality::Text, 15.0, 0.6),
        (Modality::Audio, 85.0, 0.8),
        (Modality::Video, 60.0, 0.7),
    ]);

    let maximum = engine.fuse_with(FusionStrategy::Maximum, &input).unwrap();
    let minimum = engine.fuse_with(FusionStrategy::Minimum, &input).unwrap();
    let voting = engine.fuse_with(FusionStrategy::Voting, &input).unwrap();

    assert_eq!(maximum.final_score, 85.0);
    assert_eq!(maximum.verdict, Verdict::Real);
    assert_eq!(minimum.final_score, 15.0);
    assert_eq!(minimum.verdict, Verdict::Fake);
    assert_eq!(voting.final_score, 75.0);
    assert_eq!(voting.fusion_strategy, FusionStrategy::Voting);
}

#[test]
fn test_confidence_gate_forces_uncertain() {
    let engine = FusionEngine::new(FusionConfig {
        min_confidence: Some(0.9),
        ..FusionConfig::default()
    })
    .unwrap();
    let input = results(&[(Modality::Text, 10.0, 0.5)]);
    assert_eq!(engine.fuse(&input).unwrap().verdict, Verdict::Uncertain);
}

#[test]
fn test_explanation_content() {
    let engine = FusionEngine::default();
    let input = results(&[(Modality::Text, 20.0, 0.6), (Modality::Audio, 25.0, 0.8)]);
    let fused = engine.fuse(&input).unwrap();

    assert!(fused.explanation.starts_with("Overall assessment: FAKE"));
    assert!(fused.explanation.contains("- Text: 20.0/100"));
    assert!(fused.explanation.contains("- Audio: 25.0/100"));
    assert!(fused.explanation.contains("modalities agree"));
    assert!(fused.explanation.contains("Exercise caution"));
}

#[test]
fn test_text_scorer_feeds_fusion() {
    let text = TextScorer::new().score(&TextArtifact::new(
        "BREAKING: You won't believe the shocking truth they don't want you to know! Act now!!!!",
    ));
    let mut input = BTreeMap::new();
    input.insert(Modality::Text, text.clone());

    let fused = FusionEngine::default().fuse(&input).unwrap();
    assert!((fused.final_score - text.score).abs() <= 0.05 + 1e-9);
    assert_eq!(fused.verdict, Verdict::Fake);
    assert!(fused.confidence >= text.confidence);
}
