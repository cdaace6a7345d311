//! Data models shared by the API server, the client and the renderer.
//!
//! Everything that crosses the HTTP boundary lives here so both sides
//! agree on the wire format (snake_case fields, lowercase doc types).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Heuristic document category assigned at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Email,
    Notes,
    Cv,
    Transcript,
    Other,
}

impl DocType {
    /// All document types, in the order used by the `all_data` scenario.
    pub const ALL: [DocType; 5] = [
        DocType::Email,
        DocType::Notes,
        DocType::Cv,
        DocType::Transcript,
        DocType::Other,
    ];

    /// Wire name of the doc type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Email => "email",
            DocType::Notes => "notes",
            DocType::Cv => "cv",
            DocType::Transcript => "transcript",
            DocType::Other => "other",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(DocType::Email),
            "notes" => Ok(DocType::Notes),
            "cv" => Ok(DocType::Cv),
            "transcript" => Ok(DocType::Transcript),
            "other" => Ok(DocType::Other),
            other => Err(format!("Unknown document type: {}", other)),
        }
    }
}

/// Normalized representation of a single ingested file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub doc_id: String,
    pub source_file: String,
    pub doc_type: DocType,
    pub raw_text: String,
    pub clean_text: String,
}

impl Document {
    /// First `max_chars` characters of the cleaned text, with an ellipsis
    /// when something was cut off.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.clean_text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}…", head)
        } else {
            head
        }
    }

    pub fn summary(&self, preview_chars: usize) -> DocumentSummary {
        DocumentSummary {
            doc_id: self.doc_id.clone(),
            doc_type: self.doc_type,
            source_file: self.source_file.clone(),
            preview: self.preview(preview_chars),
        }
    }

    pub fn detail(&self, preview_chars: usize) -> DocumentDetail {
        DocumentDetail {
            summary: self.summary(preview_chars),
            raw_text: self.raw_text.clone(),
            clean_text: self.clean_text.clone(),
        }
    }
}

/// Payload of `POST /ingest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub folder_path: String,
}

/// Lightweight representation of a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub doc_id: String,
    pub doc_type: DocType,
    pub source_file: String,
    pub preview: String,
}

/// Verbose document payload returned by `GET /documents/{doc_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub summary: DocumentSummary,
    pub raw_text: String,
    pub clean_text: String,
}

/// Response describing an ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub document_count: usize,
    pub doc_type_counts: BTreeMap<String, usize>,
    pub documents: Vec<DocumentSummary>,
}

/// Sentence snippet that backs an attribute prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportSentence {
    pub doc_id: String,
    pub doc_type: DocType,
    pub text: String,
}

/// Explainable output for a single attribute.
///
/// When `available` is false the prediction and features carry no meaning,
/// whatever their literal values are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeExplanation {
    pub name: String,
    pub predicted_value: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub top_features: Vec<String>,
    #[serde(default)]
    pub supporting_sentences: Vec<SupportSentence>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl AttributeExplanation {
    /// Placeholder for an attribute with no usable signal.
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predicted_value: None,
            confidence: 0.0,
            top_features: Vec::new(),
            supporting_sentences: Vec::new(),
            available: false,
        }
    }
}

/// One risk scenario: a slice of the document set and what it reveals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub doc_types: Vec<DocType>,
    pub document_count: usize,
    pub attributes: Vec<AttributeExplanation>,
}

/// Options accepted by `POST /analyze`. The default serializes to `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_types: Option<Vec<DocType>>,
    #[serde(
        default = "default_top_k_features",
        skip_serializing_if = "is_default_top_k"
    )]
    pub top_k_features: usize,
    #[serde(
        default = "default_max_supporting_sentences",
        skip_serializing_if = "is_default_max_sentences"
    )]
    pub max_supporting_sentences: usize,
}

pub const DEFAULT_TOP_K_FEATURES: usize = 5;
pub const DEFAULT_MAX_SUPPORTING_SENTENCES: usize = 3;

fn default_top_k_features() -> usize {
    DEFAULT_TOP_K_FEATURES
}

fn default_max_supporting_sentences() -> usize {
    DEFAULT_MAX_SUPPORTING_SENTENCES
}

fn is_default_top_k(value: &usize) -> bool {
    *value == DEFAULT_TOP_K_FEATURES
}

fn is_default_max_sentences(value: &usize) -> bool {
    *value == DEFAULT_MAX_SUPPORTING_SENTENCES
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            doc_types: None,
            top_k_features: DEFAULT_TOP_K_FEATURES,
            max_supporting_sentences: DEFAULT_MAX_SUPPORTING_SENTENCES,
        }
    }
}

impl AnalysisRequest {
    /// Check the numeric options against the accepted range (1..=10).
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=10).contains(&self.top_k_features) {
            return Err("top_k_features must be between 1 and 10".to_string());
        }
        if !(1..=10).contains(&self.max_supporting_sentences) {
            return Err("max_supporting_sentences must be between 1 and 10".to_string());
        }
        Ok(())
    }
}

/// Envelope returned by `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(with = "timestamp")]
    pub generated_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioResult>,
}

/// Body of every non-2xx API response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Health check payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub documents_indexed: usize,
    pub models_loaded: bool,
}

/// RFC 3339 on the way out; RFC 3339 or a naive ISO timestamp (read as UTC)
/// on the way in.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
