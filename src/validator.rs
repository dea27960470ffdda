//! Input validation: raw form fields to a typed [`InputRecord`].

use crate::error::{PipelineError, Result};
use crate::types::record::InputRecord;
use std::collections::HashMap;
use std::str::FromStr;

/// Parse the nine schema fields from a raw field map.
///
/// Fields are checked in schema order and the first missing or malformed one
/// is reported. Keys outside the schema are ignored.
pub fn validate(raw: &HashMap<String, String>) -> Result<InputRecord> {
    Ok(InputRecord {
        age: int_field(raw, "age")?,
        sex: int_field(raw, "sex")?,
        bmi: float_field(raw, "bmi")?,
        children: int_field(raw, "children")?,
        smoker: int_field(raw, "smoker")?,
        region: int_field(raw, "region")?,
        mi_all: int_field(raw, "MI-ALL")?,
        strain: int_field(raw, "STRAIN")?,
        q_isc: int_field(raw, "Q-ISC")?,
    })
}

fn int_field(raw: &HashMap<String, String>, field: &str) -> Result<i64> {
    parse_field(raw, field, "an integer")
}

fn float_field(raw: &HashMap<String, String>, field: &str) -> Result<f64> {
    let value: f64 = parse_field(raw, field, "a number")?;
    if !value.is_finite() {
        return Err(PipelineError::invalid_input(field, "expected a finite number"));
    }
    Ok(value)
}

fn parse_field<T: FromStr>(raw: &HashMap<String, String>, field: &str, expected: &str) -> Result<T> {
    let value = raw
        .get(field)
        .ok_or_else(|| PipelineError::invalid_input(field, "field is required"))?
        .trim();

    value.parse::<T>().map_err(|_| {
        PipelineError::invalid_input(field, format!("expected {expected}, got '{value}'"))
    })
}
