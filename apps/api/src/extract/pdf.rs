use std::panic::{self, AssertUnwindSafe};

use super::{DocumentFormat, ExtractError, TextExtractor};

/// PDF text via `pdf-extract`; page text streams are concatenated in document order.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, bytes: &[u8], _max_bytes: usize) -> Result<String, ExtractError> {
        // pdf-extract panics on some malformed inputs instead of returning an error.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }));

        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExtractError::Corrupt(format!("PDF extraction error: {e}"))),
            Err(_) => Err(ExtractError::Corrupt(
                "PDF parser aborted on malformed input".to_string(),
            )),
        }
    }
}
