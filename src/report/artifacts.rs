//! Artifact store: where charts and reports live on disk.
//!
//! In the per-request layout every report gets its own directory named by its
//! [`ReportId`]. The shared-slot layout keeps one fixed set of files that each
//! prediction overwrites (last writer wins). Either way every file is written
//! to a staging path and renamed into place, so readers never observe a
//! partially written file.
//!
//! Per-request directories are pruned once more than the configured number of
//! published reports exist, oldest first.

use crate::config::ArtifactLayout;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const BAR_CHART_FILE: &str = "shap_plot.png";
pub const FORCE_CHART_FILE: &str = "force_plot.png";
pub const REPORT_FILE: &str = "report.pdf";

/// URL prefix under which the artifact directory is served
pub const ARTIFACTS_URL_PREFIX: &str = "/artifacts";

/// Identifier of one generated report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Final locations of one report's artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub bar_chart: PathBuf,
    pub force_chart: PathBuf,
    pub report: PathBuf,
}

/// Reports published by this process
#[derive(Debug, Default)]
struct Published {
    latest: Option<ReportId>,
    /// Retained per-request reports, oldest first
    retained: VecDeque<ReportId>,
}

/// On-disk home of generated charts and reports
pub struct ArtifactStore {
    root: PathBuf,
    layout: ArtifactLayout,
    /// Per-request reports kept on disk; 0 keeps everything
    keep_reports: usize,
    published: Mutex<Published>,
}

impl ArtifactStore {
    /// Store that keeps every report
    pub fn new(root: impl Into<PathBuf>, layout: ArtifactLayout) -> Self {
        Self {
            root: root.into(),
            layout,
            keep_reports: 0,
            published: Mutex::new(Published::default()),
        }
    }

    /// Keep at most `keep_reports` published per-request reports (0 keeps all)
    pub fn with_retention(mut self, keep_reports: usize) -> Self {
        self.keep_reports = keep_reports;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the artifacts of a report
    pub fn report_dir(&self, id: ReportId) -> PathBuf {
        match self.layout {
            ArtifactLayout::PerRequest => self.root.join(id.to_string()),
            ArtifactLayout::SharedSlot => self.root.clone(),
        }
    }

    pub fn paths(&self, id: ReportId) -> ArtifactPaths {
        let dir = self.report_dir(id);
        ArtifactPaths {
            bar_chart: dir.join(BAR_CHART_FILE),
            force_chart: dir.join(FORCE_CHART_FILE),
            report: dir.join(REPORT_FILE),
        }
    }

    /// Create the report directory and return the artifact paths
    pub fn prepare(&self, id: ReportId) -> Result<ArtifactPaths> {
        let dir = self.report_dir(id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create artifact directory {}", dir.display()))?;
        Ok(self.paths(id))
    }

    /// Mark a fully rendered report as the latest one and prune expired reports.
    ///
    /// In the shared slot this records the id only: if another request
    /// overwrote the files before this call, the slot now holds that request's
    /// artifacts under this id (last writer wins).
    pub fn publish(&self, id: ReportId) {
        let expired: Vec<ReportId> = match self.published.lock() {
            Ok(mut published) => {
                published.latest = Some(id);
                if self.layout == ArtifactLayout::PerRequest && self.keep_reports > 0 {
                    published.retained.push_back(id);
                }
                let excess = published.retained.len().saturating_sub(self.keep_reports.max(1));
                published.retained.drain(..excess).collect()
            }
            Err(_) => Vec::new(),
        };
        debug!(report_id = %id, "Report published");

        for old in expired {
            info!(report_id = %old, "Removing expired report");
            self.discard(old);
        }
    }

    /// Remove a per-request report directory. The shared slot is never removed.
    pub fn discard(&self, id: ReportId) {
        if self.layout != ArtifactLayout::PerRequest {
            return;
        }
        let dir = self.report_dir(id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to remove report directory"),
        }
    }

    pub fn latest(&self) -> Option<ReportId> {
        self.published.lock().ok().and_then(|published| published.latest)
    }

    /// Path of a report's PDF, if it exists and is still current for the layout.
    ///
    /// In the shared slot only the latest report is retrievable.
    pub fn report_path(&self, id: ReportId) -> Option<PathBuf> {
        if self.layout == ArtifactLayout::SharedSlot && self.latest() != Some(id) {
            return None;
        }
        let path = self.paths(id).report;
        path.is_file().then_some(path)
    }

    /// Path of the most recently published report's PDF
    pub fn latest_report_path(&self) -> Option<PathBuf> {
        self.latest().and_then(|id| self.report_path(id))
    }

    /// URL path under which an artifact file of a report is served
    pub fn url_path(&self, id: ReportId, file_name: &str) -> String {
        match self.layout {
            ArtifactLayout::PerRequest => format!("{ARTIFACTS_URL_PREFIX}/{id}/{file_name}"),
            // Same file name for every report; the query defeats browser caches
            ArtifactLayout::SharedSlot => format!("{ARTIFACTS_URL_PREFIX}/{file_name}?v={id}"),
        }
    }
}

/// Staging path next to `target`, keeping its extension so encoders pick the right format
fn staging_path(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("artifact");
    let name = match target.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(".{stem}.{}.tmp.{ext}", Uuid::new_v4().simple()),
        None => format!(".{stem}.{}.tmp", Uuid::new_v4().simple()),
    };
    target.with_file_name(name)
}

/// Write `target` through a staging file and atomically rename it into place.
///
/// On failure the staging file is removed and `target` is left untouched.
pub fn write_atomically<F>(target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let staging = staging_path(target);

    let outcome = write(&staging).and_then(|()| {
        std::fs::rename(&staging, target).with_context(|| {
            format!(
                "failed to move {} into place at {}",
                staging.display(),
                target.display()
            )
        })
    });

    if outcome.is_err() && staging.exists() {
        if let Err(e) = std::fs::remove_file(&staging) {
            warn!(path = %staging.display(), error = %e, "Failed to remove staging file");
        }
    }

    outcome
}
