// Human-readable explanation of a fusion result

use crate::fusion::FusionResult;
use mmfd_common::config::AgreementConfig;
use mmfd_common::{ModalityResult, Verdict};

pub fn recommendation(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Fake => "This content shows significant indicators of manipulation or falsehood. Exercise caution and verify from reliable sources.",
        Verdict::Real => "This content appears credible with few indicators of manipulation. However, always verify important claims.",
        Verdict::Uncertain => "Analysis is inconclusive. Additional verification recommended before drawing conclusions.",
    }
}

/// Multi-line explanation: summary, per-modality breakdown, agreement note
/// and recommendation. Identical inputs give identical text.
pub fn build(result: &FusionResult, agreement_config: &AgreementConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Overall assessment: {} (score {:.1}/100)\n",
        result.verdict, result.final_score
    ));
    out.push_str(&format!(
        "Confidence: {} ({:.1}%)\n",
        result.confidence_level,
        result.confidence * 100.0
    ));
    out.push_str(&format!("Fusion strategy: {}\n\n", result.fusion_strategy));

    out.push_str("Analysis by modality:\n");
    for (modality, modality_result) in &result.modality_contributions {
        let weight = result.weights_used.get(modality).copied().unwrap_or(0.0);
        out.push_str(&format!(
            "- {}: {:.1}/100 (confidence {:.1}%, weight {:.2}); indicators: {}\n",
            modality.label(),
            modality_result.score,
            modality_result.confidence * 100.0,
            weight,
            describe_indicators(modality_result)
        ));
    }
    out.push('\n');

    match &result.agreement {
        Some(agreement) => out.push_str(&format!(
            "Agreement: {} (spread {:.1}), confidence adjusted by {:+.3}\n",
            agreement.describe(agreement_config),
            agreement.spread,
            agreement.adjustment
        )),
        None => out.push_str("Agreement: single modality, no cross-modal check\n"),
    }

    let severe: usize = result
        .modality_contributions
        .values()
        .map(|r| r.severe_count())
        .sum();
    if severe > 0 {
        out.push_str(&format!(
            "Severe indicators: {}, confidence boosted by {:+.3}\n",
            severe, result.severe_boost
        ));
    }

    out.push_str(&format!("\nRecommendation: {}", recommendation(result.verdict)));
    out
}

fn describe_indicators(result: &ModalityResult) -> String {
    if result.indicators.is_empty() {
        return "none".to_string();
    }
    result
        .indicators
        .iter()
        .map(|name| {
            if result.severe_indicators.contains(name) {
                format!("{} (severe)", name)
            } else {
                name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
