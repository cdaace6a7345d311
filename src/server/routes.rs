use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use super::app::AppState;
use super::error::{ApiError, ApiJson, ApiResult};
use crate::analysis::{default_scenarios, run_scenarios, ScenarioDefinition, ScenarioLimits};
use crate::ingestion::FolderIngester;
use crate::models::{
    AnalysisRequest, AnalysisResponse, DocumentDetail, DocumentSummary, HealthResponse,
    IngestRequest, IngestResponse,
};

/// Liveness and readiness summary.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        documents_indexed: state.store.read().len(),
        models_loaded: state.inference.is_ready(),
    })
}

/// Recursively ingest the requested folder, replacing the previous run.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<IngestRequest>,
) -> ApiResult<Json<IngestResponse>> {
    if request.folder_path.trim().is_empty() {
        return Err(ApiError::BadRequest("folder_path must not be empty.".to_string()));
    }
    let folder = PathBuf::from(request.folder_path);

    let options = state.ingest_options.clone();
    let documents = tokio::task::spawn_blocking(move || {
        FolderIngester::new(options).ingest_folder(&folder)
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    if documents.is_empty() {
        return Err(ApiError::BadRequest(
            "No supported documents were found in that folder.".to_string(),
        ));
    }

    let summaries: Vec<DocumentSummary> = documents
        .iter()
        .map(|doc| doc.summary(state.preview_length))
        .collect();

    let mut store = state.store.write();
    store.replace_all(documents);
    tracing::info!(documents = store.len(), "Document store replaced");

    Ok(Json(IngestResponse {
        document_count: store.len(),
        doc_type_counts: store.counts_by_type(),
        documents: summaries,
    }))
}

/// Lightweight catalog of all ingested documents.
pub async fn list_documents(State(state): State<Arc<AppState>>) -> Json<Vec<DocumentSummary>> {
    let store = state.store.read();
    Json(
        store
            .all()
            .iter()
            .map(|doc| doc.summary(state.preview_length))
            .collect(),
    )
}

/// Raw and cleaned text of a single document.
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
) -> ApiResult<Json<DocumentDetail>> {
    let store = state.store.read();
    store
        .get(&doc_id)
        .map(|doc| Json(doc.detail(state.preview_length)))
        .ok_or_else(|| ApiError::NotFound("Document not found.".to_string()))
}

/// Run attribute inference for the requested document slices.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<AnalysisRequest>,
) -> ApiResult<Json<AnalysisResponse>> {
    request.validate().map_err(ApiError::Unprocessable)?;

    let snapshot = state.store.read().clone();
    if snapshot.is_empty() {
        return Err(ApiError::BadRequest(
            "Ingest documents before running analysis.".to_string(),
        ));
    }
    if !state.inference.is_ready() {
        return Err(ApiError::ServiceUnavailable(
            "Models are not available yet. Run `consentlens train` first.".to_string(),
        ));
    }

    let scenarios = match request.doc_types {
        Some(ref doc_types) if !doc_types.is_empty() => {
            vec![ScenarioDefinition::custom(doc_types.clone())]
        }
        _ => default_scenarios(),
    };
    let limits = ScenarioLimits {
        top_k_features: request.top_k_features,
        max_supporting_sentences: request.max_supporting_sentences,
    };

    let worker_state = Arc::clone(&state);
    let results = tokio::task::spawn_blocking(move || {
        run_scenarios(
            &snapshot,
            &scenarios,
            &worker_state.inference,
            &worker_state.explanation,
            limits,
        )
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?;

    tracing::info!(
        scenarios = results.len(),
        cached_documents = state.explanation.cached_documents(),
        "Analysis complete"
    );

    Ok(Json(AnalysisResponse {
        generated_at: Utc::now(),
        scenarios: results,
    }))
}
