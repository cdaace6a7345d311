//! Display model for one scenario result.

use crate::models::{AttributeExplanation, ScenarioResult};

/// Maximum number of signals shown per attribute.
const MAX_SIGNALS: usize = 3;

/// Turn an identifier like `cv_review` into `Cv Review`.
pub fn friendly_label(input: &str) -> String {
    input
        .replace(['_', '-'], " ")
        .split(' ')
        .map(|chunk| {
            let mut chars = chunk.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Confidence as a whole percentage, halves rounded up.
pub fn confidence_percent(confidence: f64) -> i64 {
    (confidence * 100.0 + 0.5).floor() as i64
}

/// Rendered lines for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeView {
    pub title: String,
    pub chip: String,
    pub prediction: String,
    pub signals: Option<String>,
    pub supporting: Vec<String>,
}

impl AttributeView {
    pub fn from_attribute(attribute: &AttributeExplanation) -> Self {
        let chip = if attribute.available {
            format!("{}% confident", confidence_percent(attribute.confidence))
        } else {
            "No signal".to_string()
        };

        let prediction = match attribute.predicted_value.as_deref() {
            Some(value) if attribute.available && !value.is_empty() => value.to_string(),
            _ => "Not enough evidence in this slice".to_string(),
        };

        let signals = if attribute.available && !attribute.top_features.is_empty() {
            Some(
                attribute
                    .top_features
                    .iter()
                    .take(MAX_SIGNALS)
                    .map(|feature| format!("“{}”", feature))
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        } else {
            None
        };

        let supporting = attribute
            .supporting_sentences
            .iter()
            .map(|sentence| {
                format!(
                    "{}: {}",
                    friendly_label(sentence.doc_type.as_str()),
                    sentence.text
                )
            })
            .collect();

        Self {
            title: friendly_label(&attribute.name),
            chip,
            prediction,
            signals,
            supporting,
        }
    }
}

/// One scenario, ready to print.
#[derive(Debug, Clone)]
pub struct ScenarioCard<'a> {
    scenario: &'a ScenarioResult,
    doc_type_label: String,
}

impl<'a> ScenarioCard<'a> {
    pub fn new(scenario: &'a ScenarioResult) -> Self {
        let doc_type_label = scenario
            .doc_types
            .iter()
            .map(|doc_type| friendly_label(doc_type.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            scenario,
            doc_type_label,
        }
    }

    pub fn title(&self) -> String {
        friendly_label(&self.scenario.name)
    }

    /// `"{n} docs · {doc types}"`.
    pub fn meta(&self) -> String {
        let label = if self.doc_type_label.is_empty() {
            "All data"
        } else {
            self.doc_type_label.as_str()
        };
        format!("{} docs · {}", self.scenario.document_count, label)
    }

    pub fn attributes(&self) -> Vec<AttributeView> {
        self.scenario
            .attributes
            .iter()
            .map(AttributeView::from_attribute)
            .collect()
    }

    /// Plain-text rendering for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.title()));
        out.push_str(&format!("{}\n", self.meta()));

        let attributes = self.attributes();
        if attributes.is_empty() {
            out.push_str("  No attributes available.\n");
            return out;
        }

        for view in attributes {
            out.push_str(&format!("\n  {} [{}]\n", view.title, view.chip));
            out.push_str(&format!("    {}\n", view.prediction));
            if let Some(signals) = &view.signals {
                out.push_str(&format!("    Signals: {}\n", signals));
            }
            if !view.supporting.is_empty() {
                out.push_str("    Supporting sentences:\n");
                for line in &view.supporting {
                    out.push_str(&format!("      - {}\n", line));
                }
            }
        }
        out
    }

    /// Markdown rendering for saved reports.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("### {}\n\n", self.title()));
        out.push_str(&format!("*{}*\n\n", self.meta()));

        let attributes = self.attributes();
        if attributes.is_empty() {
            out.push_str("No attributes available.\n\n");
            return out;
        }

        for view in attributes {
            out.push_str(&format!("#### {} `{}`\n\n", view.title, view.chip));
            out.push_str(&format!("**{}**\n\n", view.prediction));
            if let Some(signals) = &view.signals {
                out.push_str(&format!("Signals: {}\n\n", signals));
            }
            if !view.supporting.is_empty() {
                out.push_str("Supporting sentences:\n\n");
                for line in &view.supporting {
                    out.push_str(&format!("- {}\n", line));
                }
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocType, SupportSentence};
    use pretty_assertions::assert_eq;

    fn attribute(available: bool) -> AttributeExplanation {
        AttributeExplanation {
            name: "location_region".to_string(),
            predicted_value: Some("Northeast".to_string()),
            confidence: 0.875,
            top_features: vec![
                "boston".to_string(),
                "cambridge".to_string(),
                "campus".to_string(),
                "harbor".to_string(),
            ],
            supporting_sentences: vec![SupportSentence {
                doc_id: "d1".to_string(),
                doc_type: DocType::Email,
                text: "I just moved to Boston.".to_string(),
            }],
            available,
        }
    }

    fn scenario(attributes: Vec<AttributeExplanation>) -> ScenarioResult {
        ScenarioResult {
            name: "emails_only".to_string(),
            doc_types: vec![DocType::Email],
            document_count: 1,
            attributes,
        }
    }

    #[test]
    fn test_friendly_label() {
        assert_eq!(friendly_label("cv_review"), "Cv Review");
        assert_eq!(friendly_label("email"), "Email");
        assert_eq!(friendly_label("field-of_study"), "Field Of Study");
        assert_eq!(friendly_label("a__b"), "A  B");
        assert_eq!(friendly_label(""), "");
    }

    #[test]
    fn test_confidence_rounds_half_up() {
        assert_eq!(confidence_percent(0.875), 88);
        assert_eq!(confidence_percent(0.5), 50);
        assert_eq!(confidence_percent(0.004), 0);
        assert_eq!(confidence_percent(1.0), 100);
    }

    #[test]
    fn test_available_attribute_shows_three_signals() {
        let view = AttributeView::from_attribute(&attribute(true));
        assert_eq!(view.title, "Location Region");
        assert_eq!(view.chip, "88% confident");
        assert_eq!(view.prediction, "Northeast");
        assert_eq!(
            view.signals.as_deref(),
            Some("“boston”, “cambridge”, “campus”")
        );
        assert_eq!(view.supporting, vec!["Email: I just moved to Boston."]);
    }

    #[test]
    fn test_unavailable_attribute_hides_prediction_and_signals() {
        let view = AttributeView::from_attribute(&attribute(false));
        assert_eq!(view.chip, "No signal");
        assert_eq!(view.prediction, "Not enough evidence in this slice");
        assert_eq!(view.signals, None);
        // sentences are listed regardless of availability
        assert_eq!(view.supporting.len(), 1);

        let text = ScenarioCard::new(&scenario(vec![attribute(false)])).render_text();
        assert!(!text.contains("Northeast"));
        assert!(!text.contains("boston”"));
    }

    #[test]
    fn test_empty_prediction_falls_back() {
        let mut attr = attribute(true);
        attr.predicted_value = Some(String::new());
        let view = AttributeView::from_attribute(&attr);
        assert_eq!(view.prediction, "Not enough evidence in this slice");
    }

    #[test]
    fn test_render_text() {
        let result = scenario(vec![attribute(true)]);
        let card = ScenarioCard::new(&result);
        let expected = [
            "Emails Only",
            "1 docs · Email",
            "",
            "  Location Region [88% confident]",
            "    Northeast",
            "    Signals: “boston”, “cambridge”, “campus”",
            "    Supporting sentences:",
            "      - Email: I just moved to Boston.",
            "",
        ]
        .join("\n");
        assert_eq!(card.render_text(), expected);
    }

    #[test]
    fn test_empty_scenario_renders_placeholders() {
        let mut result = scenario(Vec::new());
        result.doc_types = Vec::new();
        result.document_count = 0;
        let card = ScenarioCard::new(&result);
        assert_eq!(card.meta(), "0 docs · All data");
        assert_eq!(
            card.render_text(),
            "Emails Only\n0 docs · All data\n  No attributes available.\n"
        );
        assert!(card.render_markdown().contains("No attributes available."));
    }
}
