//! HTTP errors and their status codes

use crate::error::PipelineError;
use crate::server::pages;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Result type for handlers
pub type AppResult<T> = Result<T, AppError>;

/// Errors returned by request handlers
#[derive(Debug, Error)]
pub enum AppError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// No report exists for the request
    #[error("No report has been generated yet")]
    ReportNotFound,

    /// Report id in the query is not a UUID
    #[error("Invalid report id: {0}")]
    InvalidReportId(String),

    // ==================
    // Pipeline Errors
    // ==================
    /// Input errors map to 400, everything else to 500
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    // ==================
    // Server Errors (5xx)
    // ==================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ReportNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidReportId(_) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Server errors stay generic.
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Something went wrong while generating your report. Please try again later.".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = Html(pages::error_page(status, &self.public_message()));
        (status, body).into_response()
    }
}
