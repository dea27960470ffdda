//! End-to-end prediction pipeline: validate, predict, attribute, explain, render.

use crate::error::Result;
use crate::explanation::{self, Explanation};
use crate::metrics::{PipelineMetrics, Stage};
use crate::models::{AttributionEngine, InferenceEngine, ModelBundle};
use crate::report::{display_text, ArtifactPaths, DisplayText, ReportContent, ReportId, ReportRenderer};
use crate::types::{AttributionResult, InputRecord, PredictionResult};
use crate::validator;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Result of one successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub report_id: ReportId,
    pub generated_at: DateTime<Utc>,
    pub prediction: PredictionResult,
    pub attribution: AttributionResult,
    pub explanation: Explanation,
    pub artifacts: ArtifactPaths,
    pub display: DisplayText,
}

/// Runs one prediction per call. Blocking; safe to share across threads.
pub struct Pipeline {
    inference: InferenceEngine,
    attribution: AttributionEngine,
    renderer: ReportRenderer,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    pub fn new(models: Arc<ModelBundle>, renderer: ReportRenderer, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            inference: InferenceEngine::new(models.clone()),
            attribution: AttributionEngine::new(models),
            renderer,
            metrics,
        }
    }

    pub fn renderer(&self) -> &ReportRenderer {
        &self.renderer
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Validate raw fields and run the pipeline. No model is invoked on invalid input.
    pub fn run(&self, raw: &HashMap<String, String>) -> Result<PipelineOutcome> {
        let record = validator::validate(raw).inspect_err(|e| {
            self.metrics.record_failure(e.kind());
            warn!(error = %e, "Rejected prediction request");
        })?;
        self.run_record(&record)
    }

    /// Run the pipeline on an already validated record.
    pub fn run_record(&self, record: &InputRecord) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let outcome = self.execute(record);

        match &outcome {
            Ok(outcome) => {
                let elapsed = started.elapsed();
                self.metrics.record_prediction(
                    elapsed,
                    outcome.prediction.risk_probability,
                    outcome.prediction.risk_label,
                );
                info!(
                    report_id = %outcome.report_id,
                    risk_label = outcome.prediction.risk_label.as_str(),
                    risk_probability = outcome.prediction.risk_probability,
                    dominant_feature = %outcome.attribution.dominant_feature,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Prediction served"
                );
            }
            Err(e) => self.metrics.record_failure(e.kind()),
        }

        outcome
    }

    fn execute(&self, record: &InputRecord) -> Result<PipelineOutcome> {
        let stage = Instant::now();
        let prediction = self.inference.predict(record)?;
        self.metrics.record_stage(Stage::Inference, stage.elapsed());

        let stage = Instant::now();
        let attribution = self.attribution.explain(record)?;
        self.metrics.record_stage(Stage::Attribution, stage.elapsed());

        let explanation = explanation::compose(prediction.risk_label, &attribution.dominant_feature);

        let report_id = ReportId::new();
        let generated_at = Utc::now();

        let stage = Instant::now();
        let artifacts = self.renderer.render(&ReportContent {
            report_id,
            generated_at,
            prediction: &prediction,
            attribution: &attribution,
            explanation: &explanation,
        })?;
        self.metrics.record_stage(Stage::Render, stage.elapsed());

        self.renderer.store().publish(report_id);

        Ok(PipelineOutcome {
            report_id,
            generated_at,
            display: display_text(&prediction, self.renderer.currency_prefix()),
            prediction,
            attribution,
            explanation,
            artifacts,
        })
    }
}
