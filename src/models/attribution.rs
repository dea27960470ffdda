//! Attribution engine: per-feature contributions to the classifier output

use crate::error::{PipelineError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::registry::{ModelBundle, RawAttribution};
use crate::types::attribution::AttributionResult;
use crate::types::record::{InputRecord, FEATURE_COUNT, FEATURE_NAMES};
use anyhow::Context;
use std::sync::Arc;
use tracing::debug;

/// Explains the classifier's prediction for a record.
///
/// The cost regressor is never explained.
pub struct AttributionEngine {
    models: Arc<ModelBundle>,
    extractor: FeatureExtractor,
}

impl AttributionEngine {
    pub fn new(models: Arc<ModelBundle>) -> Self {
        Self {
            models,
            extractor: FeatureExtractor::new(),
        }
    }

    /// Compute the attribution for one record and pick the dominant feature.
    pub fn explain(&self, record: &InputRecord) -> Result<AttributionResult> {
        let features = self.extractor.extract(record);

        let raw = self
            .models
            .attributor()
            .attribute(&features)
            .context("explainer invocation failed")
            .map_err(PipelineError::Attribution)?;

        let (values, base_value) = align_attribution(raw).map_err(PipelineError::Attribution)?;
        let result = AttributionResult::new(values, base_value);

        debug!(
            dominant_feature = %result.dominant_feature,
            base_value = ?result.base_value,
            "Attribution complete"
        );

        Ok(result)
    }
}

/// Check that explainer output lines up with the feature schema.
///
/// Accepts exactly one value per feature, or one extra trailing value taken as
/// the base value when the explainer did not report one separately. Reported
/// feature names must match the schema order, and every value must be finite.
pub fn align_attribution(raw: RawAttribution) -> anyhow::Result<([f64; FEATURE_COUNT], Option<f64>)> {
    if let Some(names) = &raw.feature_names {
        if names.len() != FEATURE_COUNT || names.iter().zip(FEATURE_NAMES).any(|(a, b)| a != b) {
            anyhow::bail!(
                "explainer feature order {:?} does not match schema {:?}",
                names,
                FEATURE_NAMES
            );
        }
    }

    let mut values = raw.values;
    let mut base_value = raw.base_value;

    if values.len() == FEATURE_COUNT + 1 && base_value.is_none() {
        base_value = values.pop();
    }

    if values.len() != FEATURE_COUNT {
        anyhow::bail!(
            "explainer returned {} values, expected {}",
            values.len(),
            FEATURE_COUNT
        );
    }

    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        anyhow::bail!("explainer returned non-finite value for '{}'", FEATURE_NAMES[i]);
    }

    if base_value.is_some_and(|b| !b.is_finite()) {
        anyhow::bail!("explainer returned a non-finite base value");
    }

    let aligned: [f64; FEATURE_COUNT] = values
        .try_into()
        .map_err(|_| anyhow::anyhow!("explainer output length changed during alignment"))?;

    Ok((aligned, base_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registry::{CostRegressor, FeatureAttributor, RiskClassifier};

    struct Unused;

    impl RiskClassifier for Unused {
        fn predict_proba(&self, _features: &[f32]) -> anyhow::Result<f64> {
            anyhow::bail!("classifier must not be called")
        }
    }

    impl CostRegressor for Unused {
        fn predict(&self, _features: &[f32]) -> anyhow::Result<f64> {
            anyhow::bail!("regressor must not be called")
        }
    }

    struct Fixed(RawAttribution);

    impl FeatureAttributor for Fixed {
        fn attribute(&self, _features: &[f32]) -> anyhow::Result<RawAttribution> {
            Ok(self.0.clone())
        }
    }

    fn engine(raw: RawAttribution) -> AttributionEngine {
        AttributionEngine::new(Arc::new(ModelBundle::new(
            Box::new(Unused),
            Box::new(Unused),
            Box::new(Fixed(raw)),
        )))
    }

    fn record() -> InputRecord {
        InputRecord {
            age: 45,
            sex: 1,
            bmi: 31.2,
            children: 2,
            smoker: 1,
            region: 0,
            mi_all: 1,
            strain: 0,
            q_isc: 0,
        }
    }

    #[test]
    fn test_explain_picks_smoker() {
        let raw = RawAttribution::from_values(vec![0.2, 0.0, 0.4, -0.1, 1.9, 0.0, 0.3, 0.0, 0.0]);
        let result = engine(raw).explain(&record()).unwrap();

        assert_eq!(result.contributions.len(), 9);
        assert_eq!(result.dominant_feature, "smoker");
        assert_eq!(result.base_value, None);
    }

    #[test]
    fn test_trailing_value_becomes_base_value() {
        let mut values = vec![0.0; 9];
        values.push(-1.25);
        let result = engine(RawAttribution::from_values(values)).explain(&record()).unwrap();
        assert_eq!(result.base_value, Some(-1.25));
        assert_eq!(result.contributions.len(), 9);
    }

    #[test]
    fn test_misaligned_output_is_attribution_error() {
        let short = engine(RawAttribution::from_values(vec![0.1; 8]));
        assert!(matches!(
            short.explain(&record()).unwrap_err(),
            PipelineError::Attribution(_)
        ));

        let mut names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        names.swap(0, 1);
        let reordered = engine(RawAttribution {
            values: vec![0.1; 9],
            base_value: None,
            feature_names: Some(names),
        });
        assert!(reordered.explain(&record()).is_err());

        let mut values = vec![0.1; 9];
        values[3] = f64::NAN;
        let err = engine(RawAttribution::from_values(values))
            .explain(&record())
            .unwrap_err();
        assert!(err.to_string().contains("children"));
    }

    #[test]
    fn test_explicit_base_value_keeps_width_strict() {
        let raw = RawAttribution {
            values: vec![0.0; 10],
            base_value: Some(0.5),
            feature_names: None,
        };
        assert!(align_attribution(raw).is_err());
    }
}
