//! Request handlers

use crate::report::artifacts::{BAR_CHART_FILE, FORCE_CHART_FILE};
use crate::report::ReportId;
use crate::server::errors::{AppError, AppResult};
use crate::server::pages::{self, ResultLinks};
use crate::server::AppState;
use axum::{
    extract::{Form, Query, State},
    http::header,
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Separator line written after each feedback entry
pub const FEEDBACK_SEPARATOR: &str = "---";

pub async fn index() -> Html<String> {
    Html(pages::index())
}

/// Run the pipeline on the submitted form and render the result page.
///
/// A body that is not form-encoded is treated as an empty form, so it fails
/// validation on the first field.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    form: Option<Form<HashMap<String, String>>>,
) -> AppResult<Html<String>> {
    let fields = form.map(|Form(fields)| fields).unwrap_or_default();

    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.run(&fields))
        .await
        .map_err(|e| AppError::Internal(format!("prediction task failed: {e}")))??;

    let store = state.pipeline.renderer().store();
    let links = ResultLinks {
        bar_chart: store.url_path(outcome.report_id, BAR_CHART_FILE),
        force_chart: store.url_path(outcome.report_id, FORCE_CHART_FILE),
        download: format!("/download?report={}", outcome.report_id),
    };

    Ok(Html(pages::result(&outcome, &links)))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub report: Option<String>,
}

/// Send a report PDF as an attachment: the requested one, or the latest.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> AppResult<impl IntoResponse> {
    let store = state.pipeline.renderer().store();

    let path = match query.report.as_deref() {
        Some(raw) => {
            let id: ReportId = raw
                .parse()
                .map_err(|_| AppError::InvalidReportId(raw.to_string()))?;
            store.report_path(id)
        }
        None => store.latest_report_path(),
    }
    .ok_or(AppError::ReportNotFound)?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "Report disappeared before download");
        AppError::ReportNotFound
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "Serving report");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"report.pdf\""),
        ],
        bytes,
    ))
}

/// Append feedback to the log. Always answers with the thanks page.
pub async fn feedback(
    State(state): State<Arc<AppState>>,
    form: Option<Form<HashMap<String, String>>>,
) -> Html<String> {
    let text = form
        .and_then(|Form(mut fields)| fields.remove("feedback"))
        .unwrap_or_default();

    match append_feedback(&state.feedback_path, &text).await {
        Ok(()) => info!(chars = text.chars().count(), "Feedback recorded"),
        Err(e) => warn!(path = %state.feedback_path.display(), error = %e, "Failed to record feedback"),
    }

    Html(pages::thanks())
}

/// Append one entry followed by the separator line
pub async fn append_feedback(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    // Single write so concurrent entries do not interleave
    file.write_all(format!("{text}\n{FEEDBACK_SEPARATOR}\n").as_bytes())
        .await?;
    file.flush().await
}
