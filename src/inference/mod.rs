//! Attribute inference: TF-IDF features, logistic regression, and the
//! engine that turns a block of text into explainable predictions.

mod classifier;
mod engine;
mod stop_words;
mod tfidf;
pub mod train;

pub use classifier::{LogisticRegression, TrainParams};
pub use engine::{AttributeInference, AttributeModel, InferenceEngine};
pub use tfidf::TfidfVectorizer;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Inconsistent model artifact {path}: {reason}")]
    Shape { path: PathBuf, reason: String },

    #[error("Invalid training data: {0}")]
    InvalidDataset(String),
}
