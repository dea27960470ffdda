//! ONNX Runtime implementations of the model traits.
//!
//! A session run needs exclusive access, so each model sits behind its own
//! `RwLock`; concurrent requests serialize per model.

use crate::models::loader::LoadedModel;
use crate::models::registry::{CostRegressor, FeatureAttributor, RawAttribution, RiskClassifier};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::sync::RwLock;
use tracing::debug;

/// Build a `[1, n]` input tensor from a feature row
fn input_tensor(features: &[f32]) -> Result<Tensor<f32>> {
    let shape = vec![1_i64, features.len() as i64];
    Tensor::from_array((shape, features.to_vec())).context("Failed to create input tensor")
}

/// Risk classifier backed by an ONNX session
pub struct OnnxClassifier {
    model: RwLock<LoadedModel>,
}

impl OnnxClassifier {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            model: RwLock::new(model),
        }
    }
}

impl RiskClassifier for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        let mut guard = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let model = &mut *guard;
        let input = input_tensor(features)?;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input])?;

        extract_probability(&outputs, &model.output_name, &model.name)
    }
}

/// Extract the positive-class probability from classifier output.
///
/// Handles both tensor outputs (`[batch, classes]`) and seq(map) outputs
/// produced by some converters. Outputs named like `label` are skipped.
fn extract_probability(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
    model_name: &str,
) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        if let Some(prob) = probability_from_value(&output, model_name) {
            return Ok(prob);
        }
    }

    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Some(prob) = probability_from_value(&output, model_name) {
            debug!(model = %model_name, output = %name, "Probability taken from fallback output");
            return Ok(prob);
        }
    }

    anyhow::bail!("model {model_name} produced no probability output")
}

fn probability_from_value(output: &ort::value::DynValue, model_name: &str) -> Option<f64> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        let prob = positive_class_probability(&dims, data)?;
        debug!(model = %model_name, prob = prob, "Extracted from tensor");
        return Some(prob);
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return extract_from_sequence_map(output, model_name).ok();
    }

    None
}

/// Positive-class probability from a probability tensor of the given shape
fn positive_class_probability(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [_, classes] => *classes,
        [classes] => *classes,
        _ => return None,
    };

    match classes {
        c if c >= 2 => data.get(1).map(|&p| p as f64),
        1 => data.first().map(|&p| p as f64),
        _ => None,
    }
}

/// Extract probability from seq(map(int64, float)) format
fn extract_from_sequence_map(output: &ort::value::DynValue, model_name: &str) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let map_value = maps.first().context("Empty sequence")?;
    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
        return Ok(*prob as f64);
    }

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - *prob as f64);
    }

    Err(anyhow::anyhow!("No probability found in map"))
}

/// Cost regressor backed by an ONNX session
pub struct OnnxRegressor {
    model: RwLock<LoadedModel>,
}

impl OnnxRegressor {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            model: RwLock::new(model),
        }
    }
}

impl CostRegressor for OnnxRegressor {
    fn predict(&self, features: &[f32]) -> Result<f64> {
        let mut guard = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let model = &mut *guard;
        let input = input_tensor(features)?;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input])?;

        let (_, data) = outputs
            .get(&model.output_name)
            .context("regressor output missing")?
            .try_extract_tensor::<f32>()?;

        let cost = data
            .first()
            .map(|&v| v as f64)
            .context("regressor produced an empty tensor")?;
        debug!(model = %model.name, cost = cost, "Regressor prediction");
        Ok(cost)
    }
}

/// Feature attributor backed by an ONNX session returning one row of
/// contributions (optionally followed by the base value).
pub struct OnnxAttributor {
    model: RwLock<LoadedModel>,
}

impl OnnxAttributor {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            model: RwLock::new(model),
        }
    }
}

impl FeatureAttributor for OnnxAttributor {
    fn attribute(&self, features: &[f32]) -> Result<RawAttribution> {
        let mut guard = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let model = &mut *guard;
        let input = input_tensor(features)?;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input])?;

        let (shape, data) = outputs
            .get(&model.output_name)
            .context("explainer output missing")?
            .try_extract_tensor::<f32>()?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        let row = first_row(&dims, data);
        debug!(model = %model.name, width = row.len(), "Explainer contributions");

        Ok(RawAttribution::from_values(
            row.iter().map(|&v| v as f64).collect(),
        ))
    }
}

/// First row of a `[batch, width]` tensor, or the whole buffer for other ranks
fn first_row<'a>(dims: &[i64], data: &'a [f32]) -> &'a [f32] {
    match dims {
        [_, width] if *width >= 0 && (*width as usize) <= data.len() => &data[..*width as usize],
        _ => data,
    }
}
