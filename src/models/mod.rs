//! ML model registry and inference components

pub mod attribution;
pub mod inference;
pub mod loader;
pub mod onnx;
pub mod registry;

pub use attribution::AttributionEngine;
pub use inference::InferenceEngine;
pub use loader::ModelLoader;
pub use registry::{CostRegressor, FeatureAttributor, ModelBundle, RawAttribution, RiskClassifier};
