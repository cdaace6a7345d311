use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use super::routes;
use crate::config::Config;
use crate::explanation::ExplanationEngine;
use crate::inference::InferenceEngine;
use crate::ingestion::IngestOptions;
use crate::store::DocumentStore;

/// Shared application state
pub struct AppState {
    pub store: RwLock<DocumentStore>,
    pub inference: InferenceEngine,
    pub explanation: ExplanationEngine,
    pub ingest_options: IngestOptions,
    pub preview_length: usize,
    pub cors_allow_origins: Vec<String>,
}

impl AppState {
    pub fn new(config: &Config, inference: InferenceEngine) -> Arc<Self> {
        Arc::new(Self {
            store: RwLock::new(DocumentStore::new()),
            inference,
            explanation: ExplanationEngine::new(config.analysis.sentence_cache_size),
            ingest_options: IngestOptions::from(&config.ingest),
            preview_length: config.server.preview_length,
            cors_allow_origins: config.server.cors_allow_origins.clone(),
        })
    }
}

/// All API routes, without middleware.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/ingest", post(routes::ingest))
        .route("/documents", get(routes::list_documents))
        .route("/documents/:doc_id", get(routes::get_document))
        .route("/analyze", post(routes::analyze))
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.cors_allow_origins);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    api_router()
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
