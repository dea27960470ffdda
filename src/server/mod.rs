//! # HTTP Server
//!
//! Web interface over the prediction pipeline: the input form, predictions,
//! report downloads, chart images and feedback.

pub mod errors;
pub mod pages;
pub mod routes;

pub use errors::{AppError, AppResult};

use crate::pipeline::Pipeline;
use crate::report::artifacts::ARTIFACTS_URL_PREFIX;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared across handlers
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Append-only feedback log
    pub feedback_path: PathBuf,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, feedback_path: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            feedback_path: feedback_path.into(),
        }
    }
}

/// Build the router with every endpoint
pub fn router(state: AppState) -> Router {
    let artifacts_dir = state.pipeline.renderer().store().root().to_path_buf();

    Router::new()
        .route("/", get(routes::index))
        .route("/predict", post(routes::predict))
        .route("/download", get(routes::download))
        .route("/feedback", post(routes::feedback))
        // Chart images referenced by result pages
        .nest_service(ARTIFACTS_URL_PREFIX, ServeDir::new(artifacts_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}
