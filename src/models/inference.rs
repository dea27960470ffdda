//! Inference engine: risk probability, label, confidence and cost for one record

use crate::error::{PipelineError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::registry::ModelBundle;
use crate::types::prediction::PredictionResult;
use crate::types::record::InputRecord;
use anyhow::Context;
use std::sync::Arc;
use tracing::debug;

/// Runs the classifier and regressor on the same feature row.
pub struct InferenceEngine {
    models: Arc<ModelBundle>,
    extractor: FeatureExtractor,
}

impl InferenceEngine {
    pub fn new(models: Arc<ModelBundle>) -> Self {
        Self {
            models,
            extractor: FeatureExtractor::new(),
        }
    }

    /// Predict risk and cost for a validated record. No retries.
    pub fn predict(&self, record: &InputRecord) -> Result<PredictionResult> {
        let features = self.extractor.extract(record);

        let risk_probability = self
            .models
            .classifier()
            .predict_proba(&features)
            .context("classifier invocation failed")
            .and_then(check_probability)
            .map_err(PipelineError::Inference)?;

        let estimated_cost = self
            .models
            .regressor()
            .predict(&features)
            .context("regressor invocation failed")
            .map_err(PipelineError::Inference)?;

        if !estimated_cost.is_finite() {
            return Err(PipelineError::Inference(anyhow::anyhow!(
                "regressor returned non-finite cost {estimated_cost}"
            )));
        }

        let result = PredictionResult::new(risk_probability, estimated_cost);

        debug!(
            risk_probability = result.risk_probability,
            risk_label = result.risk_label.as_str(),
            estimated_cost = result.estimated_cost,
            "Inference complete"
        );

        Ok(result)
    }
}

/// Reject probabilities that are not finite or fall outside `[0, 1]`.
pub fn check_probability(probability: f64) -> anyhow::Result<f64> {
    if probability.is_finite() && (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        anyhow::bail!("classifier returned {probability}, expected a probability in [0, 1]")
    }
}
