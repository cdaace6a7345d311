//! HTTP API: folder ingestion, document catalog and scenario analysis.

mod app;
mod error;
mod routes;

pub use app::{create_app, AppState};

use crate::config::Config;
use crate::inference::InferenceEngine;
use anyhow::{Context, Result};

/// Load models, bind and serve until the process is stopped.
pub async fn serve(config: &Config) -> Result<()> {
    let inference = InferenceEngine::load(&config.server.artifacts_dir).with_context(|| {
        format!(
            "Failed to load models from {}",
            config.server.artifacts_dir.display()
        )
    })?;
    if !inference.is_ready() {
        tracing::warn!("No attribute models loaded; /analyze will answer 503 until `consentlens train` is run");
    }

    let state = AppState::new(config, inference);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    tracing::info!("Listening on {}", config.server.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
