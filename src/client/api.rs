//! HTTP client for the ConsentLens API.

use crate::models::{AnalysisRequest, AnalysisResponse, ErrorBody, IngestRequest, IngestResponse};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failures surfaced to the user as a single text message.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local precondition failed; no request was made.
    #[error("{0}")]
    Validation(String),

    #[error("A request is already in flight.")]
    Busy,

    /// Non-2xx answer; `message` is the server's `detail` or a fallback.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// Thin JSON client over the two workflow endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /ingest` with `{folder_path}`.
    pub async fn ingest(&self, folder_path: &str) -> Result<IngestResponse, ClientError> {
        let request = IngestRequest {
            folder_path: folder_path.to_string(),
        };
        self.post_json("/ingest", &request, "Ingestion failed").await
    }

    /// `POST /analyze`; the default request goes out as `{}`.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, ClientError> {
        self.post_json("/analyze", request, "Analysis failed").await
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B, fallback: &str) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| fallback.to_string());
            debug!("{} answered {}: {}", endpoint, status, message);
            return Err(ClientError::Api { status, message });
        }

        response.json::<T>().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.timeout_seconds)
        } else {
            ClientError::Transport(e)
        }
    }
}
