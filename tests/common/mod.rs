//! Stub models and fixtures shared by the integration tests

#![allow(dead_code)]

use risk_explainer::config::ArtifactLayout;
use risk_explainer::metrics::PipelineMetrics;
use risk_explainer::models::{CostRegressor, FeatureAttributor, ModelBundle, RawAttribution, RiskClassifier};
use risk_explainer::report::{ArtifactStore, ChartRenderer, ReportRenderer};
use risk_explainer::Pipeline;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Attribution values with "smoker" dominant, followed by the base value
pub const SCENARIO_ATTRIBUTION: [f64; 10] = [0.3, -0.1, 0.8, 0.0, 1.9, -0.4, 0.25, 0.0, 0.05, -1.2];

/// Model invocation counters
#[derive(Debug, Default)]
pub struct Calls {
    pub classifier: AtomicUsize,
    pub regressor: AtomicUsize,
    pub attributor: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.classifier.load(Ordering::SeqCst)
            + self.regressor.load(Ordering::SeqCst)
            + self.attributor.load(Ordering::SeqCst)
    }
}

pub struct StubClassifier {
    pub probability: anyhow::Result<f64>,
    pub calls: Arc<Calls>,
}

impl RiskClassifier for StubClassifier {
    fn predict_proba(&self, features: &[f32]) -> anyhow::Result<f64> {
        self.calls.classifier.fetch_add(1, Ordering::SeqCst);
        assert_eq!(features.len(), 9);
        match &self.probability {
            Ok(p) => Ok(*p),
            Err(e) => Err(anyhow::anyhow!("{e}")),
        }
    }
}

pub struct StubRegressor {
    pub cost: f64,
    pub calls: Arc<Calls>,
}

impl CostRegressor for StubRegressor {
    fn predict(&self, _features: &[f32]) -> anyhow::Result<f64> {
        self.calls.regressor.fetch_add(1, Ordering::SeqCst);
        Ok(self.cost)
    }
}

pub struct StubAttributor {
    pub values: Vec<f64>,
    pub calls: Arc<Calls>,
}

impl FeatureAttributor for StubAttributor {
    fn attribute(&self, _features: &[f32]) -> anyhow::Result<RawAttribution> {
        self.calls.attributor.fetch_add(1, Ordering::SeqCst);
        Ok(RawAttribution::from_values(self.values.clone()))
    }
}

/// Model behaviour for one test
pub struct StubModels {
    pub probability: anyhow::Result<f64>,
    pub cost: f64,
    pub attribution: Vec<f64>,
}

impl Default for StubModels {
    fn default() -> Self {
        Self {
            probability: Ok(0.82),
            cost: 12_345.678,
            attribution: SCENARIO_ATTRIBUTION.to_vec(),
        }
    }
}

impl StubModels {
    pub fn bundle(self) -> (Arc<ModelBundle>, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let bundle = ModelBundle::new(
            Box::new(StubClassifier {
                probability: self.probability,
                calls: calls.clone(),
            }),
            Box::new(StubRegressor {
                cost: self.cost,
                calls: calls.clone(),
            }),
            Box::new(StubAttributor {
                values: self.attribution,
                calls: calls.clone(),
            }),
        );
        (Arc::new(bundle), calls)
    }
}

pub fn pipeline_with(
    dir: &Path,
    layout: ArtifactLayout,
    models: StubModels,
) -> (Arc<Pipeline>, Arc<Calls>) {
    pipeline_with_store(ArtifactStore::new(dir, layout), models)
}

pub fn pipeline_with_store(store: ArtifactStore, models: StubModels) -> (Arc<Pipeline>, Arc<Calls>) {
    let (bundle, calls) = models.bundle();
    let renderer = ReportRenderer::new(Arc::new(store), ChartRenderer::new(300, 200), "Rs.");
    let pipeline = Pipeline::new(bundle, renderer, Arc::new(PipelineMetrics::new()));
    (Arc::new(pipeline), calls)
}

pub fn pipeline(dir: &Path) -> (Arc<Pipeline>, Arc<Calls>) {
    pipeline_with(dir, ArtifactLayout::PerRequest, StubModels::default())
}

/// Form fields of the reference applicant
pub fn scenario_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("age", "45"),
        ("sex", "1"),
        ("bmi", "31.2"),
        ("children", "2"),
        ("smoker", "1"),
        ("region", "0"),
        ("MI-ALL", "1"),
        ("STRAIN", "0"),
        ("Q-ISC", "0"),
    ]
}

pub fn scenario_form() -> HashMap<String, String> {
    scenario_fields()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// URL-encoded body of the reference applicant, minus `skip`
pub fn scenario_body(skip: Option<&str>) -> String {
    scenario_fields()
        .into_iter()
        .filter(|(k, _)| Some(*k) != skip)
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}
