//! Risk Explainer Library
//!
//! Predicts insurance risk and expected cost for an applicant record,
//! attributes the risk prediction to the input features, and renders the
//! result as charts and a downloadable PDF report behind a small web interface.

pub mod config;
pub mod error;
pub mod explanation;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod types;
pub mod validator;

pub use config::AppConfig;
pub use error::PipelineError;
pub use explanation::Explanation;
pub use feature_extractor::FeatureExtractor;
pub use models::{AttributionEngine, InferenceEngine, ModelBundle};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use report::{ArtifactStore, ReportId, ReportRenderer};
pub use types::{AttributionResult, InputRecord, PredictionResult, RiskLabel};
