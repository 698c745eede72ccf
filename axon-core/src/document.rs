//! PDF document extraction.
//!
//! Turns a source PDF into plain text plus per-page structure. This is the
//! only document format the retrieval subsystem accepts; extraction reads the
//! file and nothing else.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The referenced document path does not exist. Never retried.
    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be parsed as a PDF. Indexing aborts and no
    /// partial index entry is written.
    #[error("Failed to parse PDF: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Text extracted from a single page, 1-based page numbering.
#[derive(Debug, Clone)]
pub struct PageText {
    pub page: usize,
    pub text: String,
}

/// A fully extracted document.
///
/// `page_count` counts every page of the source document; pages with no
/// extractable text are omitted from `pages` and contribute nothing to
/// `full_text`, but still count here.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Non-empty page texts joined with a blank line, in page order.
    pub full_text: String,
    pub pages: Vec<PageText>,
    pub page_count: usize,
    pub file_name: String,
    pub file_path: PathBuf,
}

impl ExtractedDocument {
    /// Stable document identifier derived from the filename stem.
    pub fn document_id(&self) -> String {
        self.file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name.clone())
    }
}

/// Extracts text from PDF documents.
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extracts the full text and per-page structure of a PDF.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::NotFound`] when the path does not exist
    /// - [`ExtractError::Parse`] when the bytes are not a parseable PDF
    pub fn extract(path: &Path) -> Result<ExtractedDocument> {
        if !path.exists() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let raw_pages = pdf_extract::extract_text_by_pages_from_mem(&bytes)
            .map_err(|e| ExtractError::Parse(e.to_string()))?;

        let page_count = raw_pages.len();
        let pages: Vec<PageText> = raw_pages
            .iter()
            .enumerate()
            .filter_map(|(i, text)| {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(PageText {
                        page: i + 1,
                        text: trimmed.to_string(),
                    })
                }
            })
            .collect();

        let full_text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ExtractedDocument {
            full_text,
            pages,
            page_count,
            file_name,
            file_path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let err = PdfExtractor::extract(Path::new("/nonexistent/file.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[test]
    fn test_invalid_pdf_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let err = PdfExtractor::extract(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }
}
