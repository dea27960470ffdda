//! Report rendering: attribution charts and the downloadable PDF

pub mod artifacts;
pub mod charts;
pub mod format;
pub mod pdf;

pub use artifacts::{ArtifactPaths, ArtifactStore, ReportId};
pub use charts::ChartRenderer;

use crate::config::{ArtifactsConfig, ReportConfig};
use crate::error::{PipelineError, Result};
use crate::explanation::Explanation;
use crate::types::{AttributionResult, PredictionResult};
use artifacts::write_atomically;
use chrono::{DateTime, Utc};
use pdf::{ReportDocument, ReportLine};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Characters per line of wrapped report text
const WRAP_WIDTH: usize = 90;

const REPORT_TITLE: &str = "Insurance Risk Report";

/// Everything that goes into one report
#[derive(Debug, Clone, Copy)]
pub struct ReportContent<'a> {
    pub report_id: ReportId,
    pub generated_at: DateTime<Utc>,
    pub prediction: &'a PredictionResult,
    pub attribution: &'a AttributionResult,
    pub explanation: &'a Explanation,
}

/// Display strings for a prediction, shared by the PDF and the result page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayText {
    pub risk: String,
    pub cost: String,
    pub confidence: String,
}

pub fn display_text(prediction: &PredictionResult, currency_prefix: &str) -> DisplayText {
    DisplayText {
        risk: prediction.risk_label.to_string(),
        cost: format::format_currency(currency_prefix, prediction.estimated_cost),
        confidence: format::format_percent(prediction.confidence_percent),
    }
}

/// Renders the charts and PDF of a report into the artifact store
pub struct ReportRenderer {
    store: Arc<ArtifactStore>,
    charts: ChartRenderer,
    currency_prefix: String,
}

impl ReportRenderer {
    pub fn new(store: Arc<ArtifactStore>, charts: ChartRenderer, currency_prefix: impl Into<String>) -> Self {
        Self {
            store,
            charts,
            currency_prefix: currency_prefix.into(),
        }
    }

    /// Build from configuration. A font that fails to load only disables chart labels.
    pub fn from_config(store: Arc<ArtifactStore>, artifacts: &ArtifactsConfig, report: &ReportConfig) -> Self {
        let mut charts = ChartRenderer::new(artifacts.chart_width, artifacts.chart_height);
        if let Some(font_path) = &artifacts.font_path {
            match charts.clone().with_font(Path::new(font_path)) {
                Ok(labelled) => charts = labelled,
                Err(e) => warn!(error = %e, "Chart labels disabled"),
            }
        }
        Self::new(store, charts, report.currency_prefix.clone())
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    pub fn currency_prefix(&self) -> &str {
        &self.currency_prefix
    }

    /// Write the bar chart, the cumulative chart and the PDF, in that order.
    ///
    /// Each file is staged and renamed into place. The report is not published
    /// here; the caller does that once everything succeeded. On failure a
    /// per-request directory is removed again.
    pub fn render(&self, content: &ReportContent<'_>) -> Result<ArtifactPaths> {
        self.write_artifacts(content).map_err(|e| {
            self.store.discard(content.report_id);
            PipelineError::Render(e)
        })
    }

    fn write_artifacts(&self, content: &ReportContent<'_>) -> anyhow::Result<ArtifactPaths> {
        let paths = self.store.prepare(content.report_id)?;

        write_atomically(&paths.bar_chart, |staging| {
            self.charts.draw_bar_chart(content.attribution, staging)
        })?;

        write_atomically(&paths.force_chart, |staging| {
            self.charts.draw_force_chart(content.attribution, staging)
        })?;

        let document = ReportDocument {
            title: REPORT_TITLE,
            lines: self.report_lines(content),
            images: vec![paths.bar_chart.as_path(), paths.force_chart.as_path()],
        };
        write_atomically(&paths.report, |staging| pdf::write_report(staging, &document))?;

        debug!(report_id = %content.report_id, dir = %self.store.report_dir(content.report_id).display(), "Report rendered");
        Ok(paths)
    }

    fn report_lines(&self, content: &ReportContent<'_>) -> Vec<ReportLine> {
        let display = display_text(content.prediction, &self.currency_prefix);
        let mut lines = vec![
            ReportLine::Heading(REPORT_TITLE.to_string()),
            ReportLine::Blank,
            ReportLine::Text(format!("Predicted Risk: {}", display.risk)),
            ReportLine::Text(format!("Estimated Charges: {}", display.cost)),
            ReportLine::Text(format!("Confidence Score: {}", display.confidence)),
            ReportLine::Blank,
        ];

        push_wrapped(&mut lines, &format!("Reason: {}", content.explanation.rationale));
        push_wrapped(
            &mut lines,
            &format!("Policy Recommendation: {}", content.explanation.recommendation),
        );

        lines.push(ReportLine::Blank);
        lines.push(ReportLine::Text("Feature contributions:".to_string()));
        for contribution in content.attribution.by_magnitude() {
            lines.push(ReportLine::Text(format!(
                "  {:<10} {:+.4}",
                contribution.feature, contribution.value
            )));
        }
        if let Some(base) = content.attribution.base_value {
            lines.push(ReportLine::Text(format!("  base value {base:+.4}")));
        }

        lines.push(ReportLine::Blank);
        lines.push(ReportLine::Text(format!(
            "Generated: {} | Report {}",
            content.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            content.report_id
        )));
        lines
    }
}

fn push_wrapped(lines: &mut Vec<ReportLine>, text: &str) {
    lines.extend(
        format::wrap_text(text, WRAP_WIDTH)
            .into_iter()
            .map(ReportLine::Text),
    );
}
