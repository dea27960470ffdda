//! Error taxonomy for the prediction pipeline

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while validating input, running models, or rendering reports.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required field is missing or cannot be coerced to its declared type
    #[error("invalid value for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// A model artifact is missing or does not match the expected interface
    #[error("failed to load model: {0:#}")]
    ModelLoad(#[source] anyhow::Error),

    /// Classifier or regressor invocation failed
    #[error("inference failed: {0:#}")]
    Inference(#[source] anyhow::Error),

    /// Attribution model invocation failed or returned a misaligned result
    #[error("attribution failed: {0:#}")]
    Attribution(#[source] anyhow::Error),

    /// Chart or report generation failed
    #[error("report rendering failed: {0:#}")]
    Render(#[source] anyhow::Error),
}

impl PipelineError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Short, stable name used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput { .. } => "invalid_input",
            PipelineError::ModelLoad(_) => "model_load",
            PipelineError::Inference(_) => "inference",
            PipelineError::Attribution(_) => "attribution",
            PipelineError::Render(_) => "render",
        }
    }

    /// Whether the caller can fix the error by correcting the input
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::InvalidInput { .. })
    }
}
