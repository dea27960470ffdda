//! Risk Explainer - Main Entry Point
//!
//! Loads the model bundle once, then serves predictions and reports over HTTP.
//! The first command line argument overrides the configuration file path.

use anyhow::{Context, Result};
use risk_explainer::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    metrics::{MetricsReporter, PipelineMetrics},
    models::ModelBundle,
    pipeline::Pipeline,
    report::{ArtifactStore, ReportRenderer},
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_from_path(&config_path)?;

    init_logging(&config.logging)?;
    info!(config = %config_path, "Starting Risk Explainer");
    info!(
        models_dir = %config.models.models_dir,
        artifacts_dir = %config.artifacts.dir,
        layout = ?config.artifacts.layout,
        "Configuration loaded successfully"
    );

    // Fail fast: no request is served without a complete model bundle
    let models = Arc::new(ModelBundle::load(&config.models)?);

    std::fs::create_dir_all(&config.artifacts.dir)
        .with_context(|| format!("failed to create artifact directory {}", config.artifacts.dir))?;
    let store = Arc::new(
        ArtifactStore::new(&config.artifacts.dir, config.artifacts.layout)
            .with_retention(config.artifacts.keep_reports),
    );
    let renderer = ReportRenderer::from_config(store, &config.artifacts, &config.report);

    let metrics = Arc::new(PipelineMetrics::new());
    let pipeline = Arc::new(Pipeline::new(models, renderer, metrics.clone()));

    // Periodic metrics summary
    let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
    tokio::spawn(reporter.start());

    let app = server::router(AppState::new(pipeline, &config.feedback.path));
    server::serve(&config.server.socket_addr(), app, shutdown_signal()).await?;

    // Print final summary
    info!("Risk Explainer shutting down...");
    metrics.print_summary();

    Ok(())
}

/// RUST_LOG wins over the configured level
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("invalid log level '{}'", logging.level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
