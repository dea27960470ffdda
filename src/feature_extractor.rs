//! Feature encoding for model inference.
//!
//! The classifier, regressor and explainer were all trained on the same
//! nine-column frame; this module produces that row in the exact column order.

use crate::types::record::{InputRecord, FEATURE_COUNT};

/// Encodes records into the positional feature row expected by the ONNX models.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature row for a record, ordered as [`crate::types::FEATURE_NAMES`].
    pub fn extract(&self, record: &InputRecord) -> Vec<f32> {
        let mut features = Vec::with_capacity(FEATURE_COUNT);

        features.push(record.age as f32);
        features.push(record.sex as f32);
        features.push(record.bmi as f32);
        features.push(record.children as f32);
        features.push(record.smoker as f32);
        features.push(record.region as f32);
        features.push(record.mi_all as f32);
        features.push(record.strain as f32);
        features.push(record.q_isc as f32);

        features
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }
}
