//! Configuration management for the risk explainer service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// ML models configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing ONNX model files
    pub models_dir: String,
    /// Risk classifier file name
    #[serde(default = "default_classifier")]
    pub classifier: String,
    /// Cost regressor file name
    #[serde(default = "default_regressor")]
    pub regressor: String,
    /// Attribution model file name (bound to the classifier)
    #[serde(default = "default_explainer")]
    pub explainer: String,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

impl ModelsConfig {
    pub fn classifier_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.classifier)
    }

    pub fn regressor_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.regressor)
    }

    pub fn explainer_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.explainer)
    }
}

fn default_onnx_threads() -> usize {
    1
}

fn default_classifier() -> String {
    "xgb_classifier.onnx".to_string()
}

fn default_regressor() -> String {
    "xgb_regressor.onnx".to_string()
}

fn default_explainer() -> String {
    "explainer.onnx".to_string()
}

/// How report artifacts are laid out on disk
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactLayout {
    /// One directory per report, named by report id
    #[default]
    PerRequest,
    /// A single set of fixed-name files shared by every request (last writer wins)
    SharedSlot,
}

/// Report artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Root directory for charts and reports
    pub dir: String,
    #[serde(default)]
    pub layout: ArtifactLayout,
    /// Chart width in pixels
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,
    /// Chart height in pixels
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
    /// Optional font file for chart labels
    #[serde(default)]
    pub font_path: Option<String>,
    /// Per-request reports kept on disk, oldest pruned first (0 keeps all)
    #[serde(default = "default_keep_reports")]
    pub keep_reports: usize,
}

fn default_keep_reports() -> usize {
    50
}

fn default_chart_width() -> u32 {
    1200
}

fn default_chart_height() -> u32 {
    800
}

/// Report text configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Prefix placed before formatted costs
    pub currency_prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            currency_prefix: "Rs.".to_string(),
        }
    }
}

/// Feedback log configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackConfig {
    /// Append-only feedback file
    pub path: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            path: "feedback.txt".to_string(),
        }
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between periodic metrics summaries (0 disables the reporter)
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a specific path, with `RISK_EXPLAINER__*` overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("RISK_EXPLAINER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            models: ModelsConfig {
                models_dir: "model".to_string(),
                classifier: default_classifier(),
                regressor: default_regressor(),
                explainer: default_explainer(),
                onnx_threads: 1,
            },
            artifacts: ArtifactsConfig {
                dir: "static".to_string(),
                layout: ArtifactLayout::PerRequest,
                chart_width: default_chart_width(),
                chart_height: default_chart_height(),
                font_path: None,
                keep_reports: default_keep_reports(),
            },
            report: ReportConfig::default(),
            feedback: FeedbackConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
