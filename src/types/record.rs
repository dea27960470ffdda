//! Applicant record over the fixed nine-field schema

use serde::{Deserialize, Serialize};

/// Number of model input features
pub const FEATURE_COUNT: usize = 9;

/// Feature names in the positional order the models were trained on
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age", "sex", "bmi", "children", "smoker", "region", "MI-ALL", "STRAIN", "Q-ISC",
];

/// A validated applicant record.
///
/// Field order matches [`FEATURE_NAMES`]. Values are passed to the models
/// as given; no range clamping is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Age in years
    pub age: i64,

    /// Sex (categorical code)
    pub sex: i64,

    /// Body mass index
    pub bmi: f64,

    /// Number of dependent children
    pub children: i64,

    /// Smoker (binary code)
    pub smoker: i64,

    /// Residential region (categorical code)
    pub region: i64,

    /// Prior myocardial infarction indicator
    #[serde(rename = "MI-ALL")]
    pub mi_all: i64,

    /// Strain indicator
    #[serde(rename = "STRAIN")]
    pub strain: i64,

    /// Ischemia indicator
    #[serde(rename = "Q-ISC")]
    pub q_isc: i64,
}
