//! PDF text extraction.
//!
//! `pdf-extract` gives the best layout for most files; when it fails (or
//! yields nothing) the page text is pulled straight out of the content
//! streams with `lopdf`.

use super::IngestError;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::debug;

/// Extract text from a PDF file, falling back to a page-by-page `lopdf` pass.
pub fn extract_text_from_pdf(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match primary_extract(&bytes) {
        Ok(text) if !text.trim().is_empty() => return Ok(text),
        Ok(_) => debug!("pdf-extract returned no text for {}", path.display()),
        Err(reason) => debug!("pdf-extract failed on {}: {}", path.display(), reason),
    }

    fallback_extract(&bytes).map_err(|reason| IngestError::Pdf {
        path: path.to_path_buf(),
        reason,
    })
}

fn primary_extract(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract can panic on malformed files; contain it.
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("extractor panicked".to_string()),
    }
}

fn fallback_extract(bytes: &[u8]) -> Result<String, String> {
    let document = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let pages: Vec<String> = document
        .get_pages()
        .keys()
        .map(|page| document.extract_text(&[*page]).unwrap_or_default())
        .collect();
    Ok(pages.join("\n"))
}
