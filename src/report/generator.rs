//! Session report generation.
//!
//! Renders the ingestion summary followed by every scenario card as plain
//! text, Markdown or JSON.

use super::card::{friendly_label, ScenarioCard};
use crate::cli::OutputFormat;
use crate::models::{AnalysisResponse, DocumentSummary, IngestResponse};
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::path::Path;

/// Everything a report shows: the last ingest and, if run, its analysis.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport<'a> {
    pub ingest: &'a IngestResponse,
    pub analysis: Option<&'a AnalysisResponse>,
}

impl<'a> SessionReport<'a> {
    pub fn new(ingest: &'a IngestResponse, analysis: Option<&'a AnalysisResponse>) -> Self {
        Self { ingest, analysis }
    }

    /// Render in the requested format.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(generate_text_report(self)),
            OutputFormat::Markdown => Ok(generate_markdown_report(self)),
            OutputFormat::Json => generate_json_report(self),
        }
    }
}

fn local_timestamp(analysis: &AnalysisResponse) -> String {
    analysis
        .generated_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn doc_type_breakdown(ingest: &IngestResponse) -> Vec<String> {
    // BTreeMap keeps doc types sorted by name.
    ingest
        .doc_type_counts
        .iter()
        .map(|(doc_type, count)| format!("{}: {}", friendly_label(doc_type), count))
        .collect()
}

/// Generate the terminal report.
pub fn generate_text_report(report: &SessionReport<'_>) -> String {
    let mut output = String::new();

    output.push_str("ConsentLens Report\n");
    output.push_str("==================\n\n");

    output.push_str(&format!(
        "Indexed {} documents ({})\n",
        report.ingest.document_count,
        doc_type_breakdown(report.ingest).join(", ")
    ));
    for doc in &report.ingest.documents {
        output.push_str(&format!(
            "  [{}] {}\n",
            friendly_label(doc.doc_type.as_str()),
            doc.source_file
        ));
        let preview = doc.preview.replace('\n', " ");
        if !preview.trim().is_empty() {
            output.push_str(&format!("      {}\n", preview.trim()));
        }
    }
    output.push('\n');

    match report.analysis {
        Some(analysis) => {
            output.push_str(&format!("Scenario analysis ({})\n", local_timestamp(analysis)));
            output.push_str("------------------\n");
            for scenario in &analysis.scenarios {
                output.push('\n');
                output.push_str(&ScenarioCard::new(scenario).render_text());
            }
        }
        None => output.push_str("No analysis has been run yet.\n"),
    }

    output
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SessionReport<'_>) -> String {
    let mut output = String::new();

    output.push_str("# ConsentLens Report\n\n");
    output.push_str(&generate_ingest_section(report.ingest));

    match report.analysis {
        Some(analysis) => {
            output.push_str("## Scenario Analysis\n\n");
            output.push_str(&format!("*Generated {}*\n\n", local_timestamp(analysis)));
            for scenario in &analysis.scenarios {
                output.push_str(&ScenarioCard::new(scenario).render_markdown());
            }
        }
        None => output.push_str("## Scenario Analysis\n\nNo analysis has been run yet.\n\n"),
    }

    output.push_str("---\n\n");
    output.push_str("*Report generated by ConsentLens*\n");
    output
}

/// Generate the ingestion summary section.
fn generate_ingest_section(ingest: &IngestResponse) -> String {
    let mut section = String::new();

    section.push_str("## Indexed Documents\n\n");
    section.push_str(&format!("- **Documents:** {}\n", ingest.document_count));
    for line in doc_type_breakdown(ingest) {
        section.push_str(&format!("- {}\n", line));
    }
    section.push('\n');

    if !ingest.documents.is_empty() {
        section.push_str("| Type | File | Preview |\n");
        section.push_str("|:---|:---|:---|\n");
        for doc in &ingest.documents {
            section.push_str(&generate_document_row(doc));
        }
        section.push('\n');
    }

    section
}

fn generate_document_row(doc: &DocumentSummary) -> String {
    let preview = doc.preview.replace('\n', " ").replace('|', "\\|");
    format!(
        "| {} | `{}` | {} |\n",
        friendly_label(doc.doc_type.as_str()),
        doc.source_file,
        preview
    )
}

/// Generate a JSON report of `{ingest, analysis}`.
pub fn generate_json_report(report: &SessionReport<'_>) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
