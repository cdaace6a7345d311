//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ConsentLens - local, explainable privacy risk analysis for your documents
///
/// Ingest a folder of notes, emails, CVs and transcripts, then see what
/// each slice of that data reveals about you.
///
/// Examples:
///   consentlens train --data-path data/demo_training_data.jsonl
///   consentlens serve
///   consentlens report ~/Documents/my-data
///   consentlens report ~/Documents/my-data --format markdown --output risk.md
///   consentlens scan ~/Documents/my-data
///   consentlens init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .consentlens.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the ingestion and analysis HTTP API
    Serve(ServeArgs),

    /// Train the attribute models from a JSON Lines dataset
    Train(TrainArgs),

    /// Ingest a folder locally and list what would be analyzed
    Scan(ScanArgs),

    /// Ingest a folder through the API, run the analysis and render the scenarios
    Report(ReportArgs),

    /// Generate a default .consentlens.toml configuration file
    InitConfig,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind, e.g. 127.0.0.1:8000
    #[arg(long, value_name = "ADDR", env = "CONSENTLENS_BIND")]
    pub bind: Option<String>,

    /// Directory holding trained model artifacts
    #[arg(long, value_name = "DIR", env = "CONSENTLENS_ARTIFACTS_DIR")]
    pub artifacts_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TrainArgs {
    /// Training dataset (one JSON object per line)
    #[arg(long, default_value = "data/demo_training_data.jsonl", value_name = "FILE")]
    pub data_path: PathBuf,

    /// Where trained artifacts are written
    #[arg(long, default_value = "models/artifacts", value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ScanArgs {
    /// Folder to ingest
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Directory names to skip (comma-separated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// Folder the API should ingest (a path on the API host)
    #[arg(value_name = "FOLDER")]
    pub folder: String,

    /// Base URL of the ConsentLens API
    #[arg(long, value_name = "URL", env = "CONSENTLENS_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Analyze only these document types as a single custom scenario
    ///
    /// Example: --doc-types email,notes
    #[arg(long, value_name = "TYPES", value_delimiter = ',')]
    pub doc_types: Option<Vec<String>>,

    /// Signal features returned per attribute (1-10)
    #[arg(long, value_name = "COUNT")]
    pub top_k_features: Option<usize>,

    /// Supporting sentences returned per attribute (1-10)
    #[arg(long, value_name = "COUNT")]
    pub max_supporting_sentences: Option<usize>,

    /// Output format (text, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only ingest; skip the analysis step
    #[arg(long)]
    pub ingest_only: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text cards (default)
    #[default]
    Text,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Report(report) => report.validate(),
            Command::Scan(scan) => {
                if !scan.folder.exists() {
                    return Err(format!("Folder does not exist: {}", scan.folder.display()));
                }
                if !scan.folder.is_dir() {
                    return Err(format!(
                        "Folder path is not a directory: {}",
                        scan.folder.display()
                    ));
                }
                Ok(())
            }
            Command::Serve(_) | Command::Train(_) | Command::InitConfig => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl ReportArgs {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        for (flag, value) in [
            ("--top-k-features", self.top_k_features),
            ("--max-supporting-sentences", self.max_supporting_sentences),
        ] {
            if let Some(value) = value {
                if !(1..=10).contains(&value) {
                    return Err(format!("{} must be between 1 and 10", flag));
                }
            }
        }

        if let Some(ref doc_types) = self.doc_types {
            for doc_type in doc_types {
                doc_type.parse::<crate::models::DocType>()?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_report_args() -> ReportArgs {
        ReportArgs {
            folder: "/data/inbox".to_string(),
            api_url: None,
            timeout: None,
            doc_types: None,
            top_k_features: None,
            max_supporting_sentences: None,
            format: None,
            output: None,
            ingest_only: false,
        }
    }

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_parse_report_subcommand() {
        let args = Args::try_parse_from([
            "consentlens",
            "report",
            "/data/inbox",
            "--api-url",
            "http://localhost:9000",
            "--doc-types",
            "email,notes",
            "--format",
            "markdown",
        ])
        .unwrap();

        match args.command {
            Command::Report(report) => {
                assert_eq!(report.folder, "/data/inbox");
                assert_eq!(report.api_url.as_deref(), Some("http://localhost:9000"));
                assert_eq!(
                    report.doc_types,
                    Some(vec!["email".to_string(), "notes".to_string()])
                );
                assert_eq!(report.format, Some(OutputFormat::Markdown));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut report = make_report_args();
        report.api_url = Some("localhost:8000".to_string());
        assert!(make_args(Command::Report(report)).validate().is_err());
    }

    #[test]
    fn test_validation_unknown_doc_type() {
        let mut report = make_report_args();
        report.doc_types = Some(vec!["email".to_string(), "spreadsheet".to_string()]);
        let err = make_args(Command::Report(report)).validate().unwrap_err();
        assert!(err.contains("spreadsheet"));
    }

    #[test]
    fn test_validation_feature_range() {
        let mut report = make_report_args();
        report.top_k_features = Some(11);
        assert!(make_args(Command::Report(report)).validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
