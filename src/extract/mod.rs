//! PDF Text Extractor
//!
//! Batch text extraction for every PDF directly inside a folder. Each file is
//! processed in isolation on the bounded batch runner: a corrupt, encrypted
//! or unreadable PDF becomes an `ExtractionError` for that file only.
//!
//! ## Per-file steps
//! 1. Read bytes and extract text page by page (see `pdf`)
//! 2. Clean each page: trim lines, drop blank lines
//! 3. Join pages with the configured separator
//! 4. Truncate to the configured maximum on a word boundary

mod pdf;

use crate::batch::BatchRunner;
use crate::error::{require_dir, PathError};
use serde::ser::Serializer;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default maximum text length kept per document (~500KB)
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 500_000;

/// Default text placed between pages
pub const DEFAULT_PAGE_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionErrorKind {
    /// The file could not be read from disk
    Unreadable,
    /// The PDF is encrypted and yields no text
    Encrypted,
    /// Parse failure or extractor panic
    Malformed,
}

/// Per-file extraction failure
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ExtractionError {
    pub kind: ExtractionErrorKind,
    pub message: String,
}

impl ExtractionError {
    pub fn new(kind: ExtractionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Text pulled out of one PDF
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
    pub word_count: usize,
}

/// One PDF and its outcome
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub file_name: String,
    pub path: PathBuf,
    pub result: Result<ExtractedText, ExtractionError>,
}

impl Serialize for ExtractedFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(tag = "status", rename_all = "lowercase")]
        enum View<'a> {
            #[serde(rename_all = "camelCase")]
            Success {
                file_name: &'a str,
                text: &'a str,
                page_count: usize,
                word_count: usize,
            },
            #[serde(rename_all = "camelCase")]
            Failure {
                file_name: &'a str,
                error: &'a ExtractionError,
            },
        }

        let view = match &self.result {
            Ok(extracted) => View::Success {
                file_name: &self.file_name,
                text: &extracted.text,
                page_count: extracted.page_count,
                word_count: extracted.word_count,
            },
            Err(error) => View::Failure {
                file_name: &self.file_name,
                error,
            },
        };
        view.serialize(serializer)
    }
}

/// Extraction results for one folder, in directory enumeration order
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    pub folder: PathBuf,
    pub files: Vec<ExtractedFile>,
}

impl ExtractedDocument {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, file_name: &str) -> Option<&Result<ExtractedText, ExtractionError>> {
        self.files
            .iter()
            .find(|f| f.file_name == file_name)
            .map(|f| &f.result)
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &ExtractedText)> {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().ok().map(|t| (f.file_name.as_str(), t)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ExtractionError)> {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().err().map(|e| (f.file_name.as_str(), e)))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub page_separator: String,
    pub max_text_length: usize,
    pub workers: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            page_separator: DEFAULT_PAGE_SEPARATOR.to_string(),
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            workers: num_cpus::get(),
        }
    }
}

/// Batch PDF text extractor
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor {
    options: ExtractorOptions,
}

impl PdfTextExtractor {
    pub fn new(options: ExtractorOptions) -> Self {
        Self { options }
    }

    /// Extract text from every PDF directly inside `folder`
    pub async fn extract_all(&self, folder: &Path) -> Result<ExtractedDocument, PathError> {
        require_dir(folder)?;
        let pdfs = list_pdfs(folder)?;

        if pdfs.is_empty() {
            tracing::warn!("[PdfTextExtractor] No PDF files found in {}", folder.display());
            return Ok(ExtractedDocument {
                folder: folder.to_path_buf(),
                files: Vec::new(),
            });
        }

        tracing::info!(
            "[PdfTextExtractor] Extracting {} PDFs from {}",
            pdfs.len(),
            folder.display()
        );

        let separator = self.options.page_separator.clone();
        let max_len = self.options.max_text_length;
        let runner = BatchRunner::new(self.options.workers);

        let files = runner
            .run(
                pdfs,
                move |path: PathBuf| {
                    let result = extract_one(&path, &separator, max_len);
                    ExtractedFile {
                        file_name: display_name(&path),
                        path,
                        result,
                    }
                },
                |path, message| ExtractedFile {
                    file_name: display_name(path),
                    path: path.clone(),
                    result: Err(ExtractionError::new(ExtractionErrorKind::Malformed, message)),
                },
            )
            .await;

        let document = ExtractedDocument {
            folder: folder.to_path_buf(),
            files,
        };
        tracing::info!(
            "[PdfTextExtractor] Done: {} succeeded, {} failed",
            document.successes().count(),
            document.failures().count()
        );
        Ok(document)
    }
}

/// Regular files with a `.pdf` extension (any case), non-recursive
fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>, PathError> {
    let entries = std::fs::read_dir(folder).map_err(|e| PathError::io(folder, e))?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PathError::io(folder, e))?;
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    Ok(pdfs)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn extract_one(
    path: &Path,
    separator: &str,
    max_len: usize,
) -> Result<ExtractedText, ExtractionError> {
    let pages = match pdf::extract_pages(path) {
        Ok(pages) => pages,
        Err(e) => {
            tracing::warn!("[PdfTextExtractor] {} failed: {}", display_name(path), e);
            return Err(e);
        }
    };

    let text = pages
        .pages
        .iter()
        .map(|page| clean_text(page))
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join(separator);
    let text = truncate_text(&text, max_len);
    let word_count = text.split_whitespace().count();

    tracing::debug!(
        "[PdfTextExtractor] {}: {} chars, {} words, {} pages",
        display_name(path),
        text.len(),
        word_count,
        pages.page_count
    );

    Ok(ExtractedText {
        text,
        page_count: pages.page_count,
        word_count,
    })
}

/// Trim every line and drop the blank ones
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate to at most `max_len` bytes, preferring paragraph, sentence, then
/// word breaks. Never splits a UTF-8 character.
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let truncated = &text[..cut];

    if let Some(pos) = truncated.rfind("\n\n") {
        return truncated[..pos].to_string();
    }
    if let Some(pos) = truncated.rfind(". ") {
        return truncated[..=pos].to_string();
    }
    if let Some(pos) = truncated.rfind(char::is_whitespace) {
        return truncated[..pos].to_string();
    }

    truncated.to_string()
}
