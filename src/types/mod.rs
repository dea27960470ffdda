//! Type definitions for the risk explainer

pub mod attribution;
pub mod prediction;
pub mod record;

pub use attribution::AttributionResult;
pub use prediction::{PredictionResult, RiskLabel};
pub use record::{InputRecord, FEATURE_COUNT, FEATURE_NAMES};
