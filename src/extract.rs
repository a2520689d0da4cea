//! Text extraction for uploaded PDF documents.
//!
//! The HTTP layer and the batch test mode hand over raw bytes plus the
//! file name and declared content type; this module returns plain UTF-8
//! text in page order.

use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type for '{name}': {content_type}")]
    UnsupportedContentType { name: String, content_type: String },
    #[error("PDF extraction failed for '{name}': {message}")]
    Pdf { name: String, message: String },
}

/// One document as received from the user.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    /// Declared MIME type, if the client sent one.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Read a document from disk, naming it after the file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            content_type: Some(MIME_PDF.to_string()),
            bytes,
        })
    }

    fn looks_like_pdf(&self) -> bool {
        match self.content_type.as_deref() {
            Some(MIME_PDF) => true,
            // Browsers often send a generic type for local files.
            Some("application/octet-stream") | Some("") | None => {
                self.name.to_lowercase().ends_with(".pdf") || self.bytes.starts_with(b"%PDF")
            }
            Some(_) => self.name.to_lowercase().ends_with(".pdf"),
        }
    }
}

/// Extract the text of one document, all pages concatenated.
pub fn extract_text(doc: &UploadedDocument) -> Result<String, ExtractError> {
    if !doc.looks_like_pdf() {
        return Err(ExtractError::UnsupportedContentType {
            name: doc.name.clone(),
            content_type: doc.content_type.clone().unwrap_or_default(),
        });
    }
    pdf_extract::extract_text_from_mem(&doc.bytes).map_err(|e| ExtractError::Pdf {
        name: doc.name.clone(),
        message: e.to_string(),
    })
}

/// Extract every document in order. The first failure aborts the batch.
pub fn extract_all(docs: &[UploadedDocument]) -> Result<Vec<String>, ExtractError> {
    docs.iter().map(extract_text).collect()
}
