//! Model training from a JSON Lines dataset.
//!
//! Each line is an object with a `text` field and one field per attribute.
//! Missing text counts as empty, missing labels as `"Unknown"`.

use super::{AttributeModel, InferenceError, LogisticRegression, TfidfVectorizer, TrainParams};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// Attributes the demo models are trained for.
pub const ATTRIBUTES: [&str; 4] = [
    "location_region",
    "field_of_study",
    "work_status",
    "income_bracket",
];

const MAX_FEATURES: usize = 5000;
const MAX_NGRAM: usize = 2;

/// Parsed training records.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Map<String, Value>>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let content = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, InferenceError> {
        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: Map<String, Value> = serde_json::from_str(line).map_err(|e| {
                InferenceError::InvalidDataset(format!("line {}: {}", number + 1, e))
            })?;
            records.push(record);
        }

        if records.is_empty() {
            return Err(InferenceError::InvalidDataset("dataset is empty".to_string()));
        }
        if !records.iter().any(|r| r.contains_key("text")) {
            return Err(InferenceError::InvalidDataset(
                "Dataset must include a 'text' column.".to_string(),
            ));
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.get("text").and_then(Value::as_str).unwrap_or("").to_string())
            .collect()
    }

    /// Labels for one attribute column.
    pub fn labels(&self, attribute: &str) -> Result<Vec<String>, InferenceError> {
        if !self.records.iter().any(|r| r.contains_key(attribute)) {
            return Err(InferenceError::InvalidDataset(format!(
                "Dataset missing required column '{}'.",
                attribute
            )));
        }
        Ok(self
            .records
            .iter()
            .map(|r| match r.get(attribute) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "Unknown".to_string(),
                Some(other) => other.to_string(),
            })
            .collect())
    }
}

/// Train a TF-IDF + logistic regression model for one attribute.
pub fn train_attribute(attribute: &str, texts: &[String], labels: &[String]) -> AttributeModel {
    let mut vectorizer = TfidfVectorizer::new(MAX_FEATURES, MAX_NGRAM);
    vectorizer.fit(texts);
    let rows: Vec<Vec<f64>> = texts.iter().map(|t| vectorizer.transform(t)).collect();
    let classifier = LogisticRegression::fit(&rows, labels, TrainParams::default());

    AttributeModel {
        attribute_name: attribute.to_string(),
        vectorizer,
        classifier,
    }
}

/// Train every attribute in [`ATTRIBUTES`] and write the artifacts.
pub fn train_all(
    data_path: &Path,
    output_dir: &Path,
    show_progress: bool,
) -> Result<Vec<PathBuf>, InferenceError> {
    std::fs::create_dir_all(output_dir).map_err(|source| InferenceError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let dataset = Dataset::load(data_path)?;
    info!(
        "Training {} attributes on {} records",
        ATTRIBUTES.len(),
        dataset.len()
    );
    let texts = dataset.texts();

    let progress = if show_progress {
        let bar = ProgressBar::new(ATTRIBUTES.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut written = Vec::new();
    for attribute in ATTRIBUTES {
        progress.set_message(attribute);
        let labels = dataset.labels(attribute)?;
        let model = train_attribute(attribute, &texts, &labels);
        let path = model.save(output_dir)?;
        info!("Trained {} -> {}", attribute, path.display());
        written.push(path);
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceEngine;
    use tempfile::TempDir;

    const DATASET: &str = r#"
{"text": "Commuting through Boston and Cambridge for my computer science classes", "location_region": "Northeast", "field_of_study": "Computer Science", "work_status": "Student", "income_bracket": "Low"}
{"text": "Graduate research in machine learning at MIT, living near Boston", "location_region": "Northeast", "field_of_study": "Computer Science", "work_status": "Student", "income_bracket": "Low"}
{"text": "Nurse practitioner working night shifts at a hospital in Austin Texas", "location_region": "South", "field_of_study": "Nursing", "work_status": "Employed", "income_bracket": "Medium"}
{"text": "Hospital rotation schedule and patient care notes from Houston", "location_region": "South", "field_of_study": "Nursing", "work_status": "Employed", "income_bracket": null}
"#;

    #[test]
    fn test_dataset_labels_default_to_unknown() {
        let dataset = Dataset::parse(DATASET).unwrap();
        assert_eq!(dataset.len(), 4);
        let labels = dataset.labels("income_bracket").unwrap();
        assert_eq!(labels[3], "Unknown");
    }

    #[test]
    fn test_dataset_requires_attribute_columns() {
        let dataset = Dataset::parse(r#"{"text": "hello"}"#).unwrap();
        let err = dataset.labels("work_status").unwrap_err();
        assert!(err.to_string().contains("work_status"));
    }

    #[test]
    fn test_dataset_requires_text_column() {
        assert!(Dataset::parse(r#"{"work_status": "Student"}"#).is_err());
        assert!(Dataset::parse("\n\n").is_err());
        assert!(Dataset::parse("not json").is_err());
    }

    #[test]
    fn test_bundled_demo_dataset_is_complete() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/demo_training_data.jsonl");
        let dataset = Dataset::load(&path).unwrap();
        assert!(dataset.len() >= 20);
        for attribute in ATTRIBUTES {
            let labels = dataset.labels(attribute).unwrap();
            assert!(labels.iter().all(|label| label != "Unknown"));
        }
    }

    #[test]
    fn test_train_all_then_predict() {
        let tmp = TempDir::new().unwrap();
        let data_path = tmp.path().join("train.jsonl");
        std::fs::write(&data_path, DATASET).unwrap();
        let artifacts = tmp.path().join("artifacts");

        let written = train_all(&data_path, &artifacts, false).unwrap();
        assert_eq!(written.len(), ATTRIBUTES.len());

        let engine = InferenceEngine::load(&artifacts).unwrap();
        assert_eq!(engine.attribute_names().len(), 4);

        let predictions = engine.predict(
            "Nurse practitioner working night shifts at a hospital in Austin Texas",
            5,
        );
        assert_eq!(predictions.len(), 4);
        assert_eq!(
            predictions["field_of_study"].predicted_value.as_deref(),
            Some("Nursing")
        );
        for inference in predictions.values() {
            assert!(inference.confidence > 0.0 && inference.confidence <= 1.0);
            assert!(inference.top_features.len() <= 5);
        }
    }
}
