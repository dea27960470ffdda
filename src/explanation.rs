//! Explanation text for a prediction

use crate::types::prediction::RiskLabel;
use serde::{Deserialize, Serialize};

/// Recommendation shown for high-risk predictions
pub const HIGH_RISK_RECOMMENDATION: &str = "We recommend reviewing your health coverage and considering a higher coverage plan. \
Additionally, explore preventive health programs and schedule regular checkups.";

/// Recommendation shown for low-risk predictions
pub const LOW_RISK_RECOMMENDATION: &str = "Your risk is currently low. Maintain a healthy lifestyle and review your policy annually. \
You may consider a cost-effective plan if affordability is a concern.";

/// Rationale and recommendation for one prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub rationale: String,
    pub recommendation: String,
}

/// Compose the explanation. Pure and deterministic.
pub fn compose(label: RiskLabel, dominant_feature: &str) -> Explanation {
    Explanation {
        rationale: rationale(dominant_feature),
        recommendation: recommendation(label).to_string(),
    }
}

pub fn rationale(dominant_feature: &str) -> String {
    format!("Your risk is primarily affected by your '{dominant_feature}' value.")
}

pub fn recommendation(label: RiskLabel) -> &'static str {
    match label {
        RiskLabel::High => HIGH_RISK_RECOMMENDATION,
        RiskLabel::Low => LOW_RISK_RECOMMENDATION,
    }
}
