//! Attribution charts rendered to PNG with plotters.
//!
//! Text labels need a registered font. Without one the charts are drawn with
//! bars only and the PDF carries the values as text.

use crate::types::attribution::AttributionResult;
use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

/// Pushes the prediction towards high risk
const POSITIVE: RGBColor = RGBColor(255, 0, 81);
/// Pushes the prediction towards low risk
const NEGATIVE: RGBColor = RGBColor(0, 139, 251);
const GUIDE: RGBColor = RGBColor(160, 160, 160);

const FONT_FAMILY: &str = "sans-serif";

fn draw_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow::anyhow!("chart drawing failed: {e}")
}

/// Draws the bar and cumulative attribution charts
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
    labels: bool,
}

impl ChartRenderer {
    /// Renderer without text labels
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(200),
            height: height.max(150),
            labels: false,
        }
    }

    /// Register a TTF/OTF font for chart labels.
    ///
    /// Plotters keeps registered fonts for the whole process, so the font
    /// bytes are leaked once here.
    pub fn with_font(mut self, font_path: &Path) -> Result<Self> {
        let bytes = std::fs::read(font_path)
            .with_context(|| format!("failed to read font {}", font_path.display()))?;
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());

        plotters::style::register_font(FONT_FAMILY, plotters::style::FontStyle::Normal, bytes)
            .map_err(|_| anyhow::anyhow!("invalid font {}", font_path.display()))?;

        info!(font = %font_path.display(), "Chart font registered");
        self.labels = true;
        Ok(self)
    }

    pub fn has_labels(&self) -> bool {
        self.labels
    }

    fn label_size(&self) -> u32 {
        (self.height / 32).clamp(12, 28)
    }

    /// Horizontal bars per feature, largest magnitude on top.
    pub fn draw_bar_chart(&self, attribution: &AttributionResult, path: &Path) -> Result<()> {
        let rows = attribution.by_magnitude();
        let n = rows.len();

        let low = rows.iter().map(|c| c.value).fold(0.0_f64, f64::min);
        let high = rows.iter().map(|c| c.value).fold(0.0_f64, f64::max);
        let (x_min, x_max) = padded_range(low, high, self.labels);

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(x_min..x_max, 0.0..n as f64)
            .map_err(draw_err)?;

        chart
            .draw_series(rows.iter().enumerate().map(|(i, c)| {
                let (bottom, top) = row_band(n, i);
                let color = if c.value >= 0.0 { POSITIVE } else { NEGATIVE };
                Rectangle::new([(c.value.min(0.0), bottom), (c.value.max(0.0), top)], color.filled())
            }))
            .map_err(draw_err)?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, 0.0), (0.0, n as f64)],
                BLACK.stroke_width(2),
            )))
            .map_err(draw_err)?;

        if self.labels {
            let font = (FONT_FAMILY, self.label_size()).into_font();
            chart
                .draw_series(rows.iter().enumerate().map(|(i, c)| {
                    let (_, top) = row_band(n, i);
                    Text::new(
                        format!("{} {:+.3}", c.feature, c.value),
                        (x_min, top),
                        font.clone(),
                    )
                }))
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }

    /// Cumulative (force style) chart: from the base value, each feature moves
    /// the running output; red steps push it up, blue steps pull it down.
    pub fn draw_force_chart(&self, attribution: &AttributionResult, path: &Path) -> Result<()> {
        let base = attribution.base_value.unwrap_or(0.0);
        let steps = cumulative_steps(attribution);
        let n = steps.len();
        let output = attribution.output_value();

        let low = steps.iter().map(|s| s.start.min(s.end)).fold(base, f64::min);
        let high = steps.iter().map(|s| s.start.max(s.end)).fold(base, f64::max);
        let (x_min, x_max) = padded_range(low, high, self.labels);

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(x_min..x_max, 0.0..n as f64 + 1.0)
            .map_err(draw_err)?;

        chart
            .draw_series(steps.iter().enumerate().map(|(i, step)| {
                let (bottom, top) = row_band(n, i);
                let color = if step.end >= step.start { POSITIVE } else { NEGATIVE };
                Rectangle::new(
                    [(step.start.min(step.end), bottom), (step.start.max(step.end), top)],
                    color.filled(),
                )
            }))
            .map_err(draw_err)?;

        // Connectors between consecutive steps
        chart
            .draw_series(steps.windows(2).enumerate().map(|(i, pair)| {
                let (bottom, _) = row_band(n, i);
                let (_, next_top) = row_band(n, i + 1);
                PathElement::new(vec![(pair[0].end, bottom), (pair[0].end, next_top)], GUIDE)
            }))
            .map_err(draw_err)?;

        chart
            .draw_series([
                PathElement::new(vec![(base, 0.0), (base, n as f64 + 1.0)], GUIDE.stroke_width(2)),
                PathElement::new(vec![(output, 0.0), (output, n as f64 + 1.0)], BLACK.stroke_width(3)),
            ])
            .map_err(draw_err)?;

        if self.labels {
            let font = (FONT_FAMILY, self.label_size()).into_font();
            chart
                .draw_series(steps.iter().enumerate().map(|(i, step)| {
                    let (_, top) = row_band(n, i);
                    Text::new(
                        format!("{} {:+.3}", step.feature, step.end - step.start),
                        (x_min, top),
                        font.clone(),
                    )
                }))
                .map_err(draw_err)?;

            chart
                .draw_series([
                    Text::new(format!("base {base:.3}"), (base, n as f64 + 0.9), font.clone()),
                    Text::new(format!("f(x) {output:.3}"), (output, n as f64 + 0.5), font.clone()),
                ])
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

/// One step of the cumulative chart
#[derive(Debug, Clone, PartialEq)]
struct Step<'a> {
    feature: &'a str,
    start: f64,
    end: f64,
}

/// Running totals from the base value, features in descending magnitude
fn cumulative_steps(attribution: &AttributionResult) -> Vec<Step<'_>> {
    let mut running = attribution.base_value.unwrap_or(0.0);
    attribution
        .by_magnitude()
        .into_iter()
        .map(|c| {
            let start = running;
            running += c.value;
            Step {
                feature: c.feature.as_str(),
                start,
                end: running,
            }
        })
        .collect()
}

/// Vertical band of row `i` (row 0 at the top) in a chart of `n` rows
fn row_band(n: usize, i: usize) -> (f64, f64) {
    let top = (n - i) as f64 - 0.15;
    (top - 0.7, top)
}

/// Pad the value range; leave room on the left for labels when drawn
fn padded_range(low: f64, high: f64, labels: bool) -> (f64, f64) {
    let span = (high - low).max(1e-6);
    let pad = span * 0.08;
    let label_room = if labels { span * 0.45 } else { 0.0 };
    (low - pad - label_room, high + pad)
}
