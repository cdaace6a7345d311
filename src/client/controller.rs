//! Session state for the ingest-then-analyze workflow.

use super::api::{ApiClient, ClientError};
use crate::models::{AnalysisRequest, AnalysisResponse, IngestResponse};
use tracing::{info, warn};

/// Owns the latest ingest summary, analysis result and error message.
///
/// Each slot holds at most one value and is replaced wholesale by the next
/// successful request.
#[derive(Debug)]
pub struct Controller {
    client: ApiClient,
    ingest_summary: Option<IngestResponse>,
    analysis: Option<AnalysisResponse>,
    error_message: Option<String>,
    ingesting: bool,
    analyzing: bool,
}

impl Controller {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            ingest_summary: None,
            analysis: None,
            error_message: None,
            ingesting: false,
            analyzing: false,
        }
    }

    /// Ingest a folder on the server and store its summary.
    pub async fn submit_ingest(&mut self, folder_path: &str) -> Result<(), ClientError> {
        if self.ingesting {
            return Err(ClientError::Busy);
        }
        if folder_path.trim().is_empty() {
            return Err(self.record(ClientError::Validation(
                "Folder path is required.".to_string(),
            )));
        }

        self.error_message = None;
        self.analysis = None;
        self.ingesting = true;
        let result = self.client.ingest(folder_path).await;
        self.ingesting = false;

        match result {
            Ok(summary) => {
                info!("Ingested {} documents", summary.document_count);
                self.ingest_summary = Some(summary);
                Ok(())
            }
            Err(e) => Err(self.record(e)),
        }
    }

    /// Analyze the ingested documents with the server defaults.
    pub async fn run_analysis(&mut self) -> Result<(), ClientError> {
        self.run_analysis_with(&AnalysisRequest::default()).await
    }

    /// Analyze with explicit doc types and limits.
    pub async fn run_analysis_with(&mut self, request: &AnalysisRequest) -> Result<(), ClientError> {
        if self.analyzing {
            return Err(ClientError::Busy);
        }
        if self.ingest_summary.is_none() {
            return Err(self.record(ClientError::Validation(
                "Ingest some files first.".to_string(),
            )));
        }

        self.analyzing = true;
        self.error_message = None;
        let result = self.client.analyze(request).await;
        self.analyzing = false;

        match result {
            Ok(analysis) => {
                info!("Received {} scenarios", analysis.scenarios.len());
                self.analysis = Some(analysis);
                Ok(())
            }
            Err(e) => Err(self.record(e)),
        }
    }

    fn record(&mut self, err: ClientError) -> ClientError {
        warn!("{}", err);
        self.error_message = Some(err.to_string());
        err
    }

    pub fn ingest_summary(&self) -> Option<&IngestResponse> {
        self.ingest_summary.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisResponse> {
        self.analysis.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[allow(dead_code)] // Read by front ends polling for progress
    pub fn is_ingesting(&self) -> bool {
        self.ingesting
    }

    #[allow(dead_code)] // Read by front ends polling for progress
    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    /// Analysis needs a stored ingest summary and no analysis in flight.
    pub fn can_analyze(&self) -> bool {
        self.ingest_summary.is_some() && !self.analyzing
    }
}
