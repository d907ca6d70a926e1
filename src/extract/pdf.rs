//! Single-document PDF text extraction.
//!
//! pdf-extract does the primary work page by page. It can panic on malformed
//! fonts, so every call is wrapped in `catch_unwind`. lopdf parses the file
//! first (structure, page count, encryption) and is the fallback extractor
//! when pdf-extract fails or returns nothing.

use super::{ExtractionError, ExtractionErrorKind};
use lopdf::Document;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

/// Raw per-page text of one PDF
#[derive(Debug, Clone)]
pub(crate) struct PdfPages {
    pub pages: Vec<String>,
    pub page_count: usize,
}

/// Read and extract every page of `path`
pub(crate) fn extract_pages(path: &Path) -> Result<PdfPages, ExtractionError> {
    let bytes = std::fs::read(path).map_err(|e| {
        ExtractionError::new(
            ExtractionErrorKind::Unreadable,
            format!("Failed to read PDF file: {}", e),
        )
    })?;

    tracing::debug!("[PdfTextExtractor] {} bytes from {}", bytes.len(), path.display());
    extract_pages_from_mem(&bytes)
}

pub(crate) fn extract_pages_from_mem(bytes: &[u8]) -> Result<PdfPages, ExtractionError> {
    let document = load_structure(bytes)?;
    let page_count = document.get_pages().len();
    let encrypted = document.is_encrypted();

    let primary = match catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    })) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(format!("PDF extraction failed: {}", e)),
        Err(_panic) => Err("PDF extraction panicked - likely contains malformed fonts".to_string()),
    };

    let pages = match primary {
        Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => pages,
        Ok(pages) => {
            tracing::debug!("[PdfTextExtractor] Primary extractor returned no text, trying lopdf");
            match extract_with_lopdf(&document) {
                Some(fallback) if fallback.iter().any(|p| !p.trim().is_empty()) => fallback,
                _ => pages,
            }
        }
        Err(primary_err) => {
            tracing::debug!("[PdfTextExtractor] {}, trying lopdf", primary_err);
            match extract_with_lopdf(&document) {
                Some(fallback) => fallback,
                None if encrypted => {
                    return Err(ExtractionError::new(
                        ExtractionErrorKind::Encrypted,
                        "PDF is encrypted and could not be decrypted",
                    ))
                }
                None => {
                    return Err(ExtractionError::new(ExtractionErrorKind::Malformed, primary_err))
                }
            }
        }
    };

    if encrypted && pages.iter().all(|p| p.trim().is_empty()) {
        return Err(ExtractionError::new(
            ExtractionErrorKind::Encrypted,
            "PDF is encrypted and yielded no text",
        ));
    }

    Ok(PdfPages { pages, page_count })
}

/// Parse the document structure, classifying the failure
fn load_structure(bytes: &[u8]) -> Result<Document, ExtractionError> {
    let loaded = catch_unwind(AssertUnwindSafe(|| Document::load_mem(bytes)));
    match loaded {
        Ok(Ok(document)) => Ok(document),
        Ok(Err(e)) => {
            let message = e.to_string();
            let lower = message.to_lowercase();
            let kind = if lower.contains("encrypt")
                || lower.contains("decrypt")
                || lower.contains("password")
            {
                ExtractionErrorKind::Encrypted
            } else {
                ExtractionErrorKind::Malformed
            };
            Err(ExtractionError::new(kind, format!("Failed to parse PDF: {}", message)))
        }
        Err(_panic) => Err(ExtractionError::new(
            ExtractionErrorKind::Malformed,
            "PDF parser panicked on malformed input",
        )),
    }
}

/// Page-wise text via lopdf; `None` when every page fails
fn extract_with_lopdf(document: &Document) -> Option<Vec<String>> {
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return None;
    }

    let mut pages = Vec::with_capacity(page_numbers.len());
    let mut any_ok = false;
    for number in page_numbers {
        let text = catch_unwind(AssertUnwindSafe(|| document.extract_text(&[number])));
        match text {
            Ok(Ok(text)) => {
                any_ok = true;
                pages.push(text);
            }
            Ok(Err(e)) => {
                tracing::debug!("[PdfTextExtractor] lopdf failed on page {}: {}", number, e);
                pages.push(String::new());
            }
            Err(_panic) => pages.push(String::new()),
        }
    }

    any_ok.then_some(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::hello_pdf;

    #[test]
    fn test_extracts_text_from_generated_pdf() {
        let bytes = hello_pdf("Hello World");
        let pages = extract_pages_from_mem(&bytes).unwrap();
        assert_eq!(pages.page_count, 1);
        assert!(pages.pages.concat().contains("Hello"));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = extract_pages_from_mem(b"this is not a pdf at all").unwrap_err();
        assert_eq!(err.kind, ExtractionErrorKind::Malformed);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = extract_pages(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert_eq!(err.kind, ExtractionErrorKind::Unreadable);
    }
}
