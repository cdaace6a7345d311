//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.consentlens.toml` files. CLI flags and environment variables
//! take precedence over anything read from disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".consentlens.toml";

/// API base URL baked in at build time, if `CONSENTLENS_API_BASE_URL` was set.
pub const BUILD_API_BASE_URL: Option<&str> = option_env!("CONSENTLENS_API_BASE_URL");

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// API server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Client (report) settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Folder ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory holding trained attribute models.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Number of characters kept in document previews.
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,

    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            artifacts_dir: default_artifacts_dir(),
            preview_length: default_preview_length(),
            cors_allow_origins: Vec::new(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("models/artifacts")
}

fn default_preview_length() -> usize {
    320
}

/// Client settings used by the `report` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the ConsentLens API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Default API base URL: the build-time value when present, else localhost.
pub fn default_api_url() -> String {
    BUILD_API_BASE_URL
        .unwrap_or("http://localhost:8000")
        .trim_end_matches('/')
        .to_string()
}

fn default_timeout() -> u64 {
    300 // analysis over large folders can take a while
}

/// Folder ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory names skipped while walking.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            excludes: default_excludes(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_excludes() -> Vec<String> {
    vec![".git", "node_modules", "__pycache__", ".venv", "venv"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024 // 50MB
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Features reported per attribute.
    #[serde(default = "default_top_k_features")]
    pub top_k_features: usize,

    /// Supporting sentences reported per attribute.
    #[serde(default = "default_max_supporting_sentences")]
    pub max_supporting_sentences: usize,

    /// Documents whose sentences are kept in memory.
    #[serde(default = "default_sentence_cache_size")]
    pub sentence_cache_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_k_features: default_top_k_features(),
            max_supporting_sentences: default_max_supporting_sentences(),
            sentence_cache_size: default_sentence_cache_size(),
        }
    }
}

fn default_top_k_features() -> usize {
    crate::models::DEFAULT_TOP_K_FEATURES
}

fn default_max_supporting_sentences() -> usize {
    crate::models::DEFAULT_MAX_SUPPORTING_SENTENCES
}

fn default_sentence_cache_size() -> usize {
    256
}

/// Report rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format used when `--format` is not given.
    #[serde(default)]
    pub format: crate::cli::OutputFormat,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values the user actually provided override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        use crate::cli::Command;

        if args.verbose {
            self.general.verbose = true;
        }

        match &args.command {
            Command::Serve(serve) => {
                if let Some(ref bind) = serve.bind {
                    self.server.bind_addr = bind.clone();
                }
                if let Some(ref dir) = serve.artifacts_dir {
                    self.server.artifacts_dir = dir.clone();
                }
            }
            Command::Report(report) => {
                if let Some(ref url) = report.api_url {
                    self.client.api_url = url.trim_end_matches('/').to_string();
                }
                if let Some(timeout) = report.timeout {
                    self.client.timeout_seconds = timeout;
                }
                if let Some(format) = report.format {
                    self.report.format = format;
                }
            }
            Command::Scan(scan) => {
                if let Some(ref excludes) = scan.exclude {
                    self.ingest.excludes = excludes.clone();
                }
            }
            Command::Train(_) | Command::InitConfig => {}
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.server.preview_length, 320);
        assert_eq!(config.analysis.top_k_features, 5);
        assert_eq!(config.analysis.max_supporting_sentences, 3);
        assert!(config.ingest.excludes.contains(&".git".to_string()));
        assert!(!config.client.api_url.ends_with('/'));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:9000"
artifacts_dir = "/var/lib/consentlens"

[client]
api_url = "http://analysis.local:8000"

[analysis]
top_k_features = 8

[report]
format = "markdown"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(
            config.server.artifacts_dir,
            PathBuf::from("/var/lib/consentlens")
        );
        assert_eq!(config.client.api_url, "http://analysis.local:8000");
        assert_eq!(config.client.timeout_seconds, 300);
        assert_eq!(config.analysis.top_k_features, 8);
        assert_eq!(config.analysis.max_supporting_sentences, 3);
        assert_eq!(config.report.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[client]"));
        assert!(toml_str.contains("[analysis]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.server.preview_length, 320);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
