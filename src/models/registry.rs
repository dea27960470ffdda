//! Model registry: the immutable bundle of trained models shared by every request.

use crate::config::ModelsConfig;
use crate::error::{PipelineError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::attribution::align_attribution;
use crate::models::inference::check_probability;
use crate::models::loader::ModelLoader;
use crate::models::onnx::{OnnxAttributor, OnnxClassifier, OnnxRegressor};
use anyhow::Context;
use tracing::info;

/// Binary classifier producing the probability of the high-risk class.
pub trait RiskClassifier: Send + Sync {
    fn predict_proba(&self, features: &[f32]) -> anyhow::Result<f64>;
}

/// Regressor producing a continuous cost estimate.
pub trait CostRegressor: Send + Sync {
    fn predict(&self, features: &[f32]) -> anyhow::Result<f64>;
}

/// Explainer bound to the classifier, producing one contribution per feature.
pub trait FeatureAttributor: Send + Sync {
    fn attribute(&self, features: &[f32]) -> anyhow::Result<RawAttribution>;
}

/// Unvalidated explainer output.
///
/// `values` holds either one value per feature, or one value per feature
/// followed by the base value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAttribution {
    pub values: Vec<f64>,
    pub base_value: Option<f64>,
    /// Column names as reported by the explainer, if it reports them
    pub feature_names: Option<Vec<String>>,
}

impl RawAttribution {
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }
}

/// Classifier, regressor and attributor, loaded once and read-only afterwards.
pub struct ModelBundle {
    classifier: Box<dyn RiskClassifier>,
    regressor: Box<dyn CostRegressor>,
    attributor: Box<dyn FeatureAttributor>,
}

impl ModelBundle {
    pub fn new(
        classifier: Box<dyn RiskClassifier>,
        regressor: Box<dyn CostRegressor>,
        attributor: Box<dyn FeatureAttributor>,
    ) -> Self {
        Self {
            classifier,
            regressor,
            attributor,
        }
    }

    /// Load all three ONNX models and verify them.
    ///
    /// Any missing or incompatible model is a [`PipelineError::ModelLoad`].
    pub fn load(config: &ModelsConfig) -> Result<Self> {
        for path in [
            config.classifier_path(),
            config.regressor_path(),
            config.explainer_path(),
        ] {
            if !path.is_file() {
                return Err(PipelineError::ModelLoad(anyhow::anyhow!(
                    "model file {} not found",
                    path.display()
                )));
            }
        }

        let loader = ModelLoader::with_threads(config.onnx_threads).map_err(PipelineError::ModelLoad)?;

        let classifier = loader
            .load_model(config.classifier_path(), "classifier")
            .map_err(PipelineError::ModelLoad)?;
        let regressor = loader
            .load_model(config.regressor_path(), "regressor")
            .map_err(PipelineError::ModelLoad)?;
        let attributor = loader
            .load_model(config.explainer_path(), "explainer")
            .map_err(PipelineError::ModelLoad)?;

        let bundle = Self::new(
            Box::new(OnnxClassifier::new(classifier)),
            Box::new(OnnxRegressor::new(regressor)),
            Box::new(OnnxAttributor::new(attributor)),
        );
        bundle.verify()?;

        info!(models_dir = %config.models_dir, "Model bundle loaded and verified");
        Ok(bundle)
    }

    /// Run every model on an all-zero row and check the output shapes.
    pub fn verify(&self) -> Result<()> {
        let zeros = vec![0.0_f32; FeatureExtractor::new().feature_count()];

        let probability = self
            .classifier
            .predict_proba(&zeros)
            .context("classifier check failed")
            .and_then(check_probability)
            .map_err(PipelineError::ModelLoad)?;

        let cost = self
            .regressor
            .predict(&zeros)
            .context("regressor check failed")
            .map_err(PipelineError::ModelLoad)?;
        if !cost.is_finite() {
            return Err(PipelineError::ModelLoad(anyhow::anyhow!(
                "regressor returned non-finite value {cost} for the zero row"
            )));
        }

        let raw = self
            .attributor
            .attribute(&zeros)
            .context("explainer check failed")
            .map_err(PipelineError::ModelLoad)?;
        align_attribution(raw).map_err(PipelineError::ModelLoad)?;

        info!(
            zero_row_probability = probability,
            zero_row_cost = cost,
            "Model interfaces verified"
        );
        Ok(())
    }

    pub fn classifier(&self) -> &dyn RiskClassifier {
        self.classifier.as_ref()
    }

    pub fn regressor(&self) -> &dyn CostRegressor {
        self.regressor.as_ref()
    }

    pub fn attributor(&self) -> &dyn FeatureAttributor {
        self.attributor.as_ref()
    }
}
