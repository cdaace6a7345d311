//! Loads trained attribute models and produces explainable predictions.

use super::{InferenceError, LogisticRegression, TfidfVectorizer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A trained vectorizer + classifier pair for one attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeModel {
    pub attribute_name: String,
    pub vectorizer: TfidfVectorizer,
    pub classifier: LogisticRegression,
}

impl AttributeModel {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let content = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: Self =
            serde_json::from_str(&content).map_err(|source| InferenceError::Artifact {
                path: path.to_path_buf(),
                source,
            })?;
        model.check_shape().map_err(|reason| InferenceError::Shape {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(model)
    }

    /// Vocabulary indices must cover `0..idf.len()` exactly once, and the
    /// classifier needs one weight row of that width per class.
    fn check_shape(&self) -> Result<(), String> {
        let n_features = self.vectorizer.idf.len();
        if self.vectorizer.vocabulary.len() != n_features {
            return Err(format!(
                "vocabulary has {} terms but idf has {} weights",
                self.vectorizer.vocabulary.len(),
                n_features
            ));
        }
        let mut seen = vec![false; n_features];
        for (term, &index) in &self.vectorizer.vocabulary {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(format!("column {} is assigned twice", index)),
                None => return Err(format!("term '{}' points past column {}", term, n_features)),
            }
        }

        let classifier = &self.classifier;
        if classifier.classes.is_empty() {
            return Err("classifier has no classes".to_string());
        }
        if classifier.coef.len() != classifier.classes.len()
            || classifier.intercept.len() != classifier.classes.len()
        {
            return Err(format!(
                "{} classes but {} weight rows and {} intercepts",
                classifier.classes.len(),
                classifier.coef.len(),
                classifier.intercept.len()
            ));
        }
        if let Some(row) = classifier.coef.iter().find(|row| row.len() != n_features) {
            return Err(format!(
                "weight row has {} columns, expected {}",
                row.len(),
                n_features
            ));
        }
        Ok(())
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf, InferenceError> {
        let path = dir.join(format!("{}.json", self.attribute_name));
        let content = serde_json::to_string(self).map_err(|source| InferenceError::Artifact {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, content).map_err(|source| InferenceError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn predict(&self, text: &str, top_k: usize) -> Option<AttributeInference> {
        let vector = self.vectorizer.transform(text);
        let (best, confidence) = self.classifier.predict_best(&vector)?;
        let predicted_value = self.classifier.classes.get(best)?.clone();
        let weights = self.classifier.coef.get(best)?;
        let feature_names = self.vectorizer.feature_names();

        let contributions: Vec<f64> = vector
            .iter()
            .zip(weights)
            .map(|(x, w)| x * w)
            .collect();

        let mut ranked: Vec<usize> = (0..contributions.len()).collect();
        ranked.sort_by(|&a, &b| {
            contributions[b]
                .partial_cmp(&contributions[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut candidates: Vec<usize> = ranked
            .iter()
            .copied()
            .filter(|&i| contributions[i] > 0.0)
            .collect();
        if candidates.is_empty() {
            let mut by_weight: Vec<usize> = (0..vector.len()).filter(|&i| vector[i] > 0.0).collect();
            by_weight.sort_by(|&a, &b| {
                vector[b]
                    .partial_cmp(&vector[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            candidates = by_weight;
        }
        if candidates.is_empty() {
            candidates = ranked.into_iter().take(top_k).collect();
        }

        let mut seen = HashSet::new();
        let mut top_features = Vec::new();
        let mut feature_contributions = BTreeMap::new();
        for index in candidates {
            let feature = feature_names[index];
            if seen.insert(feature) {
                feature_contributions.insert(feature.to_string(), contributions[index]);
                top_features.push(feature.to_string());
            }
            if top_features.len() >= top_k {
                break;
            }
        }

        Some(AttributeInference {
            name: self.attribute_name.clone(),
            predicted_value: Some(predicted_value),
            confidence,
            top_features,
            feature_contributions,
        })
    }
}

/// Explainable prediction for a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInference {
    pub name: String,
    pub predicted_value: Option<String>,
    pub confidence: f64,
    pub top_features: Vec<String>,
    pub feature_contributions: BTreeMap<String, f64>,
}

/// Holds every attribute model found in the artifacts directory.
#[derive(Debug, Default)]
pub struct InferenceEngine {
    models: BTreeMap<String, AttributeModel>,
}

impl InferenceEngine {
    /// Load every `*.json` artifact from `artifacts_dir`.
    ///
    /// A missing directory is created and yields an engine that is not ready.
    /// Artifacts that fail to parse or have mismatched shapes are skipped
    /// with a warning.
    pub fn load(artifacts_dir: &Path) -> Result<Self, InferenceError> {
        let mut engine = Self::default();

        if !artifacts_dir.exists() {
            std::fs::create_dir_all(artifacts_dir).map_err(|source| InferenceError::Io {
                path: artifacts_dir.to_path_buf(),
                source,
            })?;
            warn!(
                "Artifacts directory {} was missing; no models loaded",
                artifacts_dir.display()
            );
            return Ok(engine);
        }

        let entries = std::fs::read_dir(artifacts_dir).map_err(|source| InferenceError::Io {
            path: artifacts_dir.to_path_buf(),
            source,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match AttributeModel::load(&path) {
                Ok(model) => {
                    debug!("Loaded model {} from {}", model.attribute_name, path.display());
                    engine.insert(model);
                }
                Err(e) => warn!("Skipping artifact {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} attribute models", engine.models.len());
        Ok(engine)
    }

    pub fn insert(&mut self, model: AttributeModel) {
        self.models.insert(model.attribute_name.clone(), model);
    }

    pub fn is_ready(&self) -> bool {
        !self.models.is_empty()
    }

    /// Attribute names, sorted.
    pub fn attribute_names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    /// Predictions for every attribute; empty for blank text or no models.
    pub fn predict(&self, text: &str, top_k_features: usize) -> BTreeMap<String, AttributeInference> {
        if text.trim().is_empty() || self.models.is_empty() {
            return BTreeMap::new();
        }
        self.models
            .iter()
            .filter_map(|(name, model)| {
                model
                    .predict(text, top_k_features)
                    .map(|inference| (name.clone(), inference))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::TrainParams;
    use tempfile::TempDir;

    fn trained_model() -> AttributeModel {
        let texts = vec![
            "I study computer science at the university",
            "my computer science degree and university lectures",
            "working as a nurse at the hospital",
            "hospital shifts as a nurse this week",
        ];
        let labels: Vec<String> = ["cs", "cs", "health", "health"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut vectorizer = TfidfVectorizer::new(5000, 2);
        vectorizer.fit(&texts);
        let rows: Vec<Vec<f64>> = texts.iter().map(|t| vectorizer.transform(t)).collect();
        let classifier = LogisticRegression::fit(&rows, &labels, TrainParams::default());

        AttributeModel {
            attribute_name: "field_of_study".to_string(),
            vectorizer,
            classifier,
        }
    }

    #[test]
    fn test_predict_returns_explained_inference() {
        let mut engine = InferenceEngine::default();
        engine.insert(trained_model());

        let predictions = engine.predict("another hospital shift as a nurse", 3);
        let inference = &predictions["field_of_study"];

        assert_eq!(inference.predicted_value.as_deref(), Some("health"));
        assert!(inference.confidence > 0.5 && inference.confidence <= 1.0);
        assert!(!inference.top_features.is_empty());
        assert!(inference.top_features.len() <= 3);
        assert!(inference
            .top_features
            .iter()
            .any(|f| f.contains("hospital") || f.contains("nurse")));
        for feature in &inference.top_features {
            assert!(inference.feature_contributions.contains_key(feature));
        }
    }

    #[test]
    fn test_predict_blank_text_is_empty() {
        let mut engine = InferenceEngine::default();
        engine.insert(trained_model());
        assert!(engine.predict("   \n", 5).is_empty());
    }

    #[test]
    fn test_unknown_words_still_yield_features() {
        let mut engine = InferenceEngine::default();
        engine.insert(trained_model());

        let predictions = engine.predict("zzz qqq", 2);
        assert_eq!(predictions["field_of_study"].top_features.len(), 2);
    }

    #[test]
    fn test_load_round_trips_artifacts() {
        let tmp = TempDir::new().unwrap();
        trained_model().save(tmp.path()).unwrap();
        std::fs::write(tmp.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(tmp.path().join("README.txt"), "ignored").unwrap();

        let engine = InferenceEngine::load(tmp.path()).unwrap();
        assert!(engine.is_ready());
        assert_eq!(engine.attribute_names(), vec!["field_of_study"]);
    }

    #[test]
    fn test_inconsistent_artifacts_are_rejected() {
        let tmp = TempDir::new().unwrap();

        let mut out_of_range = trained_model();
        let width = out_of_range.vectorizer.idf.len();
        out_of_range.vectorizer.vocabulary.insert("zzz".to_string(), width);
        out_of_range.vectorizer.idf.truncate(width - 1);
        let path = out_of_range.save(tmp.path()).unwrap();
        assert!(matches!(
            AttributeModel::load(&path),
            Err(InferenceError::Shape { .. })
        ));

        let mut short_rows = trained_model();
        short_rows.attribute_name = "short_rows".to_string();
        short_rows.classifier.coef[0].pop();
        let path = short_rows.save(tmp.path()).unwrap();
        let err = AttributeModel::load(&path).unwrap_err();
        assert!(err.to_string().contains("weight row"));

        let engine = InferenceEngine::load(tmp.path()).unwrap();
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_load_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("artifacts");

        let engine = InferenceEngine::load(&dir).unwrap();
        assert!(!engine.is_ready());
        assert!(dir.is_dir());
        assert!(engine.predict("anything", 5).is_empty());
    }
}
