//! Turns uploaded document bytes into plain text.
//!
//! Each supported format has a `TextExtractor`; the `ExtractorRegistry` picks one by
//! `DocumentFormat`. Adding a format means registering another extractor, callers stay
//! unchanged.

pub mod docx;
pub mod pdf;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Failed to extract text: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves a format from a filename's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("docx") => Ok(DocumentFormat::Docx),
            Some(other) => Err(ExtractError::UnsupportedFormat(format!(".{other}"))),
            None => Err(ExtractError::UnsupportedFormat(format!(
                "'{filename}' has no extension"
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A format-specific text extractor. Implementations are synchronous and CPU-bound;
/// async callers should run them on the blocking pool.
pub trait TextExtractor: Send + Sync {
    fn format(&self) -> DocumentFormat;

    /// `max_bytes` bounds any decompressed intermediate the extractor reads.
    fn extract(&self, bytes: &[u8], max_bytes: usize) -> Result<String, ExtractError>;
}

pub struct ExtractorRegistry {
    extractors: HashMap<DocumentFormat, Arc<dyn TextExtractor>>,
    max_input_bytes: usize,
}

impl ExtractorRegistry {
    pub fn new(max_input_bytes: usize) -> Self {
        Self {
            extractors: HashMap::new(),
            max_input_bytes,
        }
    }

    /// Registry with the PDF and docx extractors installed.
    pub fn with_defaults(max_input_bytes: usize) -> Self {
        let mut registry = Self::new(max_input_bytes);
        registry.register(Arc::new(PdfExtractor));
        registry.register(Arc::new(DocxExtractor));
        registry
    }

    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) {
        self.extractors.insert(extractor.format(), extractor);
    }

    /// Checks the size bound without extracting anything.
    pub fn check_size(&self, size: usize) -> Result<(), ExtractError> {
        if size > self.max_input_bytes {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.max_input_bytes,
            });
        }
        Ok(())
    }

    /// Extracts plain text. Zero-length input is an empty document and yields `""`.
    pub fn extract(&self, bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
        let extractor = self
            .extractors
            .get(&format)
            .ok_or_else(|| ExtractError::UnsupportedFormat(format.to_string()))?;

        self.check_size(bytes.len())?;
        if bytes.is_empty() {
            return Ok(String::new());
        }

        let mut text = extractor.extract(bytes, self.max_input_bytes)?;
        // Postgres text columns reject NUL.
        if text.contains('\0') {
            text.retain(|c| c != '\0');
        }
        Ok(text)
    }
}
