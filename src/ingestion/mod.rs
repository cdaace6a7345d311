//! Folder ingestion: discover supported files, extract and normalize their
//! text, and tag each one with a heuristic document type.

mod pdf;

use crate::models::{DocType, Document};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use pdf::extract_text_from_pdf;

/// File extensions the ingester reads (lowercase, without dot).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "pdf"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Folder not found: {0}")]
    FolderNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(PathBuf),

    #[error("Unable to extract text from PDF: {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for folder ingestion.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Directory names skipped while walking (e.g. [".git", "node_modules"])
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&crate::config::IngestConfig::default())
    }
}

impl From<&crate::config::IngestConfig> for IngestOptions {
    fn from(config: &crate::config::IngestConfig) -> Self {
        Self {
            excludes: config.excludes.clone(),
            max_file_size: config.max_file_size,
        }
    }
}

/// Infer a high-level document type from the file name.
pub fn detect_doc_type(file_path: &Path) -> DocType {
    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let has_any = |tokens: &[&str]| tokens.iter().any(|token| name.contains(token));

    if has_any(&["mail", "email", "inbox", "sent"]) {
        DocType::Email
    } else if has_any(&["cv", "resume"]) {
        DocType::Cv
    } else if has_any(&["note", "journal"]) {
        DocType::Notes
    } else if has_any(&["transcript", "grade"]) {
        DocType::Transcript
    } else {
        DocType::Other
    }
}

struct CleanPatterns {
    blank_runs: Regex,
    space_runs: Regex,
    page_numbers: Regex,
}

fn clean_patterns() -> &'static CleanPatterns {
    static PATTERNS: OnceLock<CleanPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CleanPatterns {
        blank_runs: Regex::new(r"\n{3,}").expect("valid regex"),
        space_runs: Regex::new(r"[ \t]{2,}").expect("valid regex"),
        page_numbers: Regex::new(r"(?m)^[ \t]*\d+[ \t]*$").expect("valid regex"),
    })
}

/// Normalize extracted text: unify line endings, squeeze blank lines and
/// runs of spaces, drop lines holding only a page number.
pub fn clean_text(text: &str) -> String {
    let patterns = clean_patterns();
    let text = text.replace("\r\n", "\n");
    let text = patterns.blank_runs.replace_all(&text, "\n\n");
    let text = patterns.space_runs.replace_all(&text, " ");
    let text = patterns.page_numbers.replace_all(&text, "");
    text.trim().to_string()
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Whether the ingester knows how to read this file.
pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Read the text content of a single supported file.
pub fn extract_text(file_path: &Path) -> Result<String, IngestError> {
    match extension_of(file_path).as_str() {
        "txt" | "md" => {
            let bytes = std::fs::read(file_path).map_err(|source| IngestError::Io {
                path: file_path.to_path_buf(),
                source,
            })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        "pdf" => extract_text_from_pdf(file_path),
        _ => Err(IngestError::UnsupportedFile(file_path.to_path_buf())),
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

/// Folder ingester.
pub struct FolderIngester {
    options: IngestOptions,
}

impl FolderIngester {
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }

    /// Walk a folder tree and return normalized documents.
    ///
    /// Unsupported, oversized or unreadable files are skipped; only a
    /// missing or non-directory root is an error.
    pub fn ingest_folder(&self, folder_path: &Path) -> Result<Vec<Document>, IngestError> {
        let expanded = expand_home(folder_path);
        if !expanded.exists() {
            return Err(IngestError::FolderNotFound(expanded));
        }
        let root = std::fs::canonicalize(&expanded).map_err(|source| IngestError::Io {
            path: expanded.clone(),
            source,
        })?;
        if !root.is_dir() {
            return Err(IngestError::NotADirectory(root));
        }

        info!("Ingesting folder: {}", root.display());

        let mut documents = Vec::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Cannot read directory entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !is_supported(path) {
                debug!("Skipping unsupported file {}", path.display());
                continue;
            }

            if let Ok(metadata) = entry.metadata() {
                if metadata.len() > self.options.max_file_size {
                    warn!(
                        "Skipping {} ({} bytes exceeds limit of {})",
                        path.display(),
                        metadata.len(),
                        self.options.max_file_size
                    );
                    continue;
                }
            }

            let raw_text = match extract_text(path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };

            let doc = Document {
                doc_id: uuid::Uuid::new_v4().simple().to_string(),
                source_file: path.to_string_lossy().to_string(),
                doc_type: detect_doc_type(path),
                clean_text: clean_text(&raw_text),
                raw_text,
            };
            debug!("Ingested {} as {}", doc.source_file, doc.doc_type);
            documents.push(doc);
        }

        info!("Ingested {} documents", documents.len());
        Ok(documents)
    }

    /// Excluded directory names, matched exactly.
    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        self.options.excludes.iter().any(|pattern| name == pattern.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_doc_type() {
        assert_eq!(detect_doc_type(Path::new("/x/My_Email.txt")), DocType::Email);
        assert_eq!(detect_doc_type(Path::new("inbox-2023.md")), DocType::Email);
        assert_eq!(detect_doc_type(Path::new("resume_final.pdf")), DocType::Cv);
        assert_eq!(detect_doc_type(Path::new("project_notes.md")), DocType::Notes);
        assert_eq!(detect_doc_type(Path::new("journal.txt")), DocType::Notes);
        assert_eq!(
            detect_doc_type(Path::new("transcript_2022.pdf")),
            DocType::Transcript
        );
        assert_eq!(detect_doc_type(Path::new("grades.txt")), DocType::Transcript);
        assert_eq!(detect_doc_type(Path::new("misc.txt")), DocType::Other);
    }

    #[test]
    fn test_detect_doc_type_first_match_wins() {
        // "sent" is checked before "notes"
        assert_eq!(detect_doc_type(Path::new("sent_notes.txt")), DocType::Email);
        // "cv" is checked before "transcript"
        assert_eq!(
            detect_doc_type(Path::new("cv_transcript.txt")),
            DocType::Cv
        );
    }

    #[test]
    fn test_clean_text() {
        let raw = "Title\r\n\r\n\r\n\r\nBody   with\t\tgaps\n  12  \nNext page";
        assert_eq!(clean_text(raw), "Title\n\nBody with gaps\n\nNext page");
    }

    #[test]
    fn test_clean_text_keeps_numbers_inside_lines() {
        assert_eq!(clean_text("Room 101 is booked"), "Room 101 is booked");
    }

    #[test]
    fn test_ingest_folder_reads_supported_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(
            root.join("my_email.txt"),
            "From: test@example.com\nSubject: Hello Boston",
        )
        .unwrap();
        fs::write(
            root.join("project_notes.md"),
            "Daily journal entry about research progress.",
        )
        .unwrap();
        fs::write(root.join("image.jpg"), "binary").unwrap();

        let ingester = FolderIngester::new(IngestOptions::default());
        let documents = ingester.ingest_folder(root).unwrap();

        assert_eq!(documents.len(), 2);
        let doc_types: Vec<DocType> = documents.iter().map(|d| d.doc_type).collect();
        assert!(doc_types.contains(&DocType::Email));
        assert!(doc_types.contains(&DocType::Notes));
        assert!(documents.iter().all(|d| d.doc_id.len() == 32));
    }

    #[test]
    fn test_ingest_folder_recurses_and_skips_excluded_dirs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("2023/cv")).unwrap();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("2023/cv/resume.md"), "Software engineer in Berlin.").unwrap();
        fs::write(root.join("node_modules/notes.txt"), "ignored").unwrap();

        let ingester = FolderIngester::new(IngestOptions::default());
        let documents = ingester.ingest_folder(root).unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].doc_type, DocType::Cv);
        assert!(documents[0].source_file.ends_with("resume.md"));
    }

    #[test]
    fn test_ingest_folder_skips_oversized_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("big_notes.txt"), "x".repeat(64)).unwrap();

        let ingester = FolderIngester::new(IngestOptions {
            excludes: Vec::new(),
            max_file_size: 16,
        });
        assert!(ingester.ingest_folder(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_ingest_folder_skips_broken_pdf() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.pdf"), "not really a pdf").unwrap();
        fs::write(tmp.path().join("notes.txt"), "still here").unwrap();

        let ingester = FolderIngester::new(IngestOptions::default());
        let documents = ingester.ingest_folder(tmp.path()).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].clean_text, "still here");
    }

    #[test]
    fn test_ingest_missing_folder() {
        let ingester = FolderIngester::new(IngestOptions::default());
        let err = ingester
            .ingest_folder(Path::new("/no/such/folder/anywhere"))
            .unwrap_err();
        assert!(matches!(err, IngestError::FolderNotFound(_)));
    }

    #[test]
    fn test_ingest_file_instead_of_folder() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();

        let ingester = FolderIngester::new(IngestOptions::default());
        let err = ingester.ingest_folder(&file).unwrap_err();
        assert!(matches!(err, IngestError::NotADirectory(_)));
    }

    #[test]
    fn test_extract_text_rejects_unsupported() {
        let err = extract_text(Path::new("photo.png")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFile(_)));
    }
}
