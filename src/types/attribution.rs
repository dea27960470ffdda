//! Feature attribution data structures

use crate::types::record::{FEATURE_COUNT, FEATURE_NAMES};
use serde::{Deserialize, Serialize};

/// Contribution of one feature to the classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature: String,
    pub value: f64,
}

/// Per-feature attribution for one classifier prediction.
///
/// Always holds exactly [`FEATURE_COUNT`] entries in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub contributions: Vec<FeatureAttribution>,
    /// Expected model output the contributions are relative to, when the explainer reports it
    pub base_value: Option<f64>,
    /// Feature with the largest attribution value (first in schema order on ties)
    pub dominant_feature: String,
}

impl AttributionResult {
    /// Build from values aligned with [`FEATURE_NAMES`].
    pub fn new(values: [f64; FEATURE_COUNT], base_value: Option<f64>) -> Self {
        let dominant = dominant_index(&values);
        let contributions = FEATURE_NAMES
            .iter()
            .zip(values)
            .map(|(name, value)| FeatureAttribution {
                feature: (*name).to_string(),
                value,
            })
            .collect();

        Self {
            contributions,
            base_value,
            dominant_feature: FEATURE_NAMES[dominant].to_string(),
        }
    }

    /// Contributions ordered by absolute value, largest first (stable on ties)
    pub fn by_magnitude(&self) -> Vec<&FeatureAttribution> {
        let mut sorted: Vec<&FeatureAttribution> = self.contributions.iter().collect();
        sorted.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
        sorted
    }

    /// Base value plus the sum of all contributions
    pub fn output_value(&self) -> f64 {
        self.base_value.unwrap_or(0.0) + self.contributions.iter().map(|c| c.value).sum::<f64>()
    }
}

/// Index of the maximum value; the first index wins on ties.
fn dominant_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    best
}
