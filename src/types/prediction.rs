//! Prediction result data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Probabilities strictly above this value are labelled high risk
pub const RISK_THRESHOLD: f64 = 0.5;

/// Binary risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    High,
    Low,
}

impl RiskLabel {
    /// Label a positive-class probability. Exactly 0.5 is `Low`.
    pub fn from_probability(probability: f64) -> Self {
        if probability > RISK_THRESHOLD {
            RiskLabel::High
        } else {
            RiskLabel::Low
        }
    }

    /// Lowercase name used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::High => "high",
            RiskLabel::Low => "low",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::High => write!(f, "High Risk"),
            RiskLabel::Low => write!(f, "Low Risk"),
        }
    }
}

/// Output of the inference engine for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Classifier probability of the positive (high risk) class
    pub risk_probability: f64,
    pub risk_label: RiskLabel,
    /// `risk_probability * 100` rounded to two decimals
    pub confidence_percent: f64,
    /// Regressor point estimate, currency agnostic
    pub estimated_cost: f64,
}

impl PredictionResult {
    pub fn new(risk_probability: f64, estimated_cost: f64) -> Self {
        Self {
            risk_probability,
            risk_label: RiskLabel::from_probability(risk_probability),
            confidence_percent: confidence_percent(risk_probability),
            estimated_cost,
        }
    }
}

/// Probability as a percentage rounded to two decimals.
///
/// Rounds the exact decimal value of `probability * 100`, ties to even, so
/// `0.00015` gives `0.01` rather than the `0.02` a second scaling would produce.
pub fn confidence_percent(probability: f64) -> f64 {
    let percent = probability * 100.0;
    format!("{percent:.2}").parse().unwrap_or(percent)
}
