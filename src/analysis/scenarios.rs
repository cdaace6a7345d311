//! Scenario definitions and execution.

use crate::explanation::ExplanationEngine;
use crate::inference::InferenceEngine;
use crate::models::{AttributeExplanation, DocType, Document, ScenarioResult};
use crate::store::DocumentStore;
use tracing::debug;

/// Which doc types belong to a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDefinition {
    pub name: String,
    pub doc_types: Vec<DocType>,
}

impl ScenarioDefinition {
    pub fn new(name: impl Into<String>, doc_types: Vec<DocType>) -> Self {
        Self {
            name: name.into(),
            doc_types,
        }
    }

    /// Single scenario for an explicit doc-type selection.
    pub fn custom(doc_types: Vec<DocType>) -> Self {
        Self::new("custom_selection", doc_types)
    }
}

/// Scenarios run when the request does not name doc types.
pub fn default_scenarios() -> Vec<ScenarioDefinition> {
    vec![
        ScenarioDefinition::new("emails_only", vec![DocType::Email]),
        ScenarioDefinition::new("notes_only", vec![DocType::Notes]),
        ScenarioDefinition::new("cv_only", vec![DocType::Cv]),
        ScenarioDefinition::new("all_data", DocType::ALL.to_vec()),
    ]
}

/// Limits applied to every attribute explanation.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioLimits {
    pub top_k_features: usize,
    pub max_supporting_sentences: usize,
}

/// Execute all requested scenarios and collect explainable predictions.
pub fn run_scenarios(
    store: &DocumentStore,
    scenarios: &[ScenarioDefinition],
    inference: &InferenceEngine,
    explanation: &ExplanationEngine,
    limits: ScenarioLimits,
) -> Vec<ScenarioResult> {
    scenarios
        .iter()
        .map(|scenario| run_single_scenario(store, scenario, inference, explanation, limits))
        .collect()
}

fn run_single_scenario(
    store: &DocumentStore,
    scenario: &ScenarioDefinition,
    inference: &InferenceEngine,
    explanation: &ExplanationEngine,
    limits: ScenarioLimits,
) -> ScenarioResult {
    let scenario_docs: Vec<&Document> = store.filter_by_types(&scenario.doc_types);

    let combined_text = scenario_docs
        .iter()
        .map(|doc| doc.clean_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let combined_text = combined_text.trim();

    let predictions = if combined_text.is_empty() {
        Default::default()
    } else {
        inference.predict(combined_text, limits.top_k_features)
    };

    debug!(
        scenario = %scenario.name,
        documents = scenario_docs.len(),
        predictions = predictions.len(),
        "Scenario evaluated"
    );

    let attributes = inference
        .attribute_names()
        .into_iter()
        .map(|name| {
            let prediction = if scenario_docs.is_empty() {
                None
            } else {
                predictions.get(&name)
            };
            match prediction {
                None => AttributeExplanation::unavailable(name),
                Some(prediction) => {
                    debug!(
                        attribute = %name,
                        contributions = ?prediction.feature_contributions,
                        "Feature contributions"
                    );
                    let supporting_sentences = explanation.collect_supporting_sentences(
                        scenario_docs.iter().copied(),
                        &prediction.top_features,
                        limits.max_supporting_sentences,
                    );
                    AttributeExplanation {
                        name,
                        predicted_value: prediction.predicted_value.clone(),
                        confidence: prediction.confidence,
                        top_features: prediction.top_features.clone(),
                        supporting_sentences,
                        available: true,
                    }
                }
            }
        })
        .collect();

    ScenarioResult {
        name: scenario.name.clone(),
        doc_types: scenario.doc_types.clone(),
        document_count: scenario_docs.len(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::train::train_attribute;

    fn doc(id: &str, doc_type: DocType, text: &str) -> Document {
        Document {
            doc_id: id.to_string(),
            source_file: format!("/data/{}.txt", id),
            doc_type,
            raw_text: text.to_string(),
            clean_text: text.to_string(),
        }
    }

    fn engine() -> InferenceEngine {
        let texts: Vec<String> = vec![
            "studying computer science at the university".to_string(),
            "university lectures on computer science".to_string(),
            "nurse shifts at the hospital".to_string(),
            "hospital patients and nurse rotations".to_string(),
        ];
        let labels: Vec<String> = ["cs", "cs", "nursing", "nursing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut engine = InferenceEngine::default();
        engine.insert(train_attribute("field_of_study", &texts, &labels));
        engine
    }

    fn store_of(docs: Vec<Document>) -> DocumentStore {
        let mut store = DocumentStore::new();
        store.replace_all(docs);
        store
    }

    fn limits() -> ScenarioLimits {
        ScenarioLimits {
            top_k_features: 5,
            max_supporting_sentences: 3,
        }
    }

    #[test]
    fn test_default_scenarios() {
        let names: Vec<String> = default_scenarios().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["emails_only", "notes_only", "cv_only", "all_data"]);
        assert_eq!(default_scenarios()[3].doc_types.len(), 5);
    }

    #[test]
    fn test_empty_slice_marks_attributes_unavailable() {
        let docs = vec![doc("a", DocType::Notes, "Night shift at the hospital as a nurse.")];
        let results = run_scenarios(
            &store_of(docs),
            &default_scenarios(),
            &engine(),
            &ExplanationEngine::default(),
            limits(),
        );

        let emails = &results[0];
        assert_eq!(emails.name, "emails_only");
        assert_eq!(emails.document_count, 0);
        assert_eq!(emails.attributes.len(), 1);
        assert!(!emails.attributes[0].available);
        assert_eq!(emails.attributes[0].predicted_value, None);
        assert_eq!(emails.attributes[0].confidence, 0.0);

        let notes = &results[1];
        assert_eq!(notes.document_count, 1);
        let attribute = &notes.attributes[0];
        assert!(attribute.available);
        assert_eq!(attribute.predicted_value.as_deref(), Some("nursing"));
        assert!(!attribute.supporting_sentences.is_empty());
        assert!(attribute.supporting_sentences.len() <= 3);
        assert_eq!(attribute.supporting_sentences[0].doc_id, "a");
    }

    #[test]
    fn test_blank_documents_yield_unavailable_attributes() {
        let docs = vec![doc("a", DocType::Cv, "   ")];
        let results = run_scenarios(
            &store_of(docs),
            &[ScenarioDefinition::custom(vec![DocType::Cv])],
            &engine(),
            &ExplanationEngine::default(),
            limits(),
        );
        assert_eq!(results[0].name, "custom_selection");
        assert_eq!(results[0].document_count, 1);
        assert!(!results[0].attributes[0].available);
    }

    #[test]
    fn test_no_models_means_no_attributes() {
        let docs = vec![doc("a", DocType::Email, "Hello from Boston.")];
        let results = run_scenarios(
            &store_of(docs),
            &default_scenarios(),
            &InferenceEngine::default(),
            &ExplanationEngine::default(),
            limits(),
        );
        assert!(results.iter().all(|r| r.attributes.is_empty()));
    }
}
