// Weight re-normalization over the modalities actually present

use mmfd_common::config::ModalityWeights;
use mmfd_common::Modality;
use std::collections::BTreeMap;
use tracing::warn;

/// Base weights of `present` modalities scaled to sum to 1.0
///
/// When every present modality has a configured weight of zero the present
/// modalities share the weight equally.
pub fn normalize(
    weights: &ModalityWeights,
    present: impl IntoIterator<Item = Modality>,
) -> BTreeMap<Modality, f64> {
    let base: BTreeMap<Modality, f64> = present
        .into_iter()
        .map(|modality| (modality, weights.get(modality)))
        .collect();
    if base.is_empty() {
        return base;
    }

    let total: f64 = base.values().sum();
    if total <= 0.0 {
        warn!(
            "All present modalities have zero weight, splitting equally across {}",
            base.len()
        );
        let equal = 1.0 / base.len() as f64;
        return base.into_keys().map(|modality| (modality, equal)).collect();
    }

    base.into_iter()
        .map(|(modality, weight)| (modality, weight / total))
        .collect()
}
