//! Plain-text extraction from uploaded résumé files.
//!
//! `FileExtractor::extract` is total: size caps, unsupported formats, parser
//! failures and parser panics all end in `None`, with a log line and, where
//! the operator should know, an alert.

pub mod docx;
pub mod pdf;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::notify::{AlertCategory, Notifier};
use crate::telegram::{ChatPlatform, Document, TelegramError};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File too large: {size} bytes (maximum {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("PDF too large: {pages} pages (maximum {max})")]
    PdfTooLarge { pages: usize, max: usize },

    #[error("PDF Reading Error: {0}")]
    Pdf(String),

    #[error("DOCX Reading Error: {0}")]
    Docx(String),

    #[error("File Processing Error: {0}")]
    Platform(#[from] TelegramError),

    #[error("File Processing Error: extraction task failed: {0}")]
    Task(String),
}

impl ExtractionError {
    fn alert_category(&self) -> AlertCategory {
        match self {
            ExtractionError::FileTooLarge { .. } => AlertCategory::FileSizeExceeded,
            ExtractionError::PdfTooLarge { .. } => AlertCategory::PdfTooLarge,
            ExtractionError::Pdf(_) => AlertCategory::PdfProcessing,
            ExtractionError::Docx(_) => AlertCategory::DocxProcessing,
            ExtractionError::Platform(_) | ExtractionError::Task(_) => {
                AlertCategory::FileProcessing
            }
        }
    }
}

/// Formats are chosen by file extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Txt,
    Pdf,
    Docx,
    /// Legacy Word; recognised so it can be refused with a specific message.
    Doc,
    Unsupported,
}

impl DocumentFormat {
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        match lower.rsplit_once('.').map(|(_, ext)| ext) {
            Some("txt") => DocumentFormat::Txt,
            Some("pdf") => DocumentFormat::Pdf,
            Some("docx") => DocumentFormat::Docx,
            Some("doc") => DocumentFormat::Doc,
            _ => DocumentFormat::Unsupported,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    pub max_file_size: u64,
    pub max_pdf_pages: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_pdf_pages: 50,
        }
    }
}

/// Decodes `bytes` according to `format`. CPU-bound; call off the runtime.
pub fn extract_text(
    format: DocumentFormat,
    bytes: &[u8],
    max_pdf_pages: usize,
) -> Result<Option<String>, ExtractionError> {
    let text = match format {
        // Invalid byte sequences are dropped; valid text is kept verbatim.
        DocumentFormat::Txt => bytes.utf8_chunks().map(|chunk| chunk.valid()).collect::<String>(),
        DocumentFormat::Pdf => pdf::extract_pdf_text(bytes, max_pdf_pages)?,
        DocumentFormat::Docx => docx::extract_docx_text(bytes)?,
        DocumentFormat::Doc | DocumentFormat::Unsupported => return Ok(None),
    };

    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

#[derive(Clone)]
pub struct FileExtractor {
    limits: ExtractionLimits,
    notifier: Notifier,
}

impl FileExtractor {
    pub fn new(limits: ExtractionLimits, notifier: Notifier) -> Self {
        Self { limits, notifier }
    }

    /// Downloads and decodes an uploaded document. Never fails.
    pub async fn extract(&self, platform: &dyn ChatPlatform, document: &Document) -> Option<String> {
        let file_name = document.file_name.as_deref().unwrap_or("Unknown");
        match self.try_extract(platform, document).await {
            Ok(text) => {
                if text.is_none() {
                    info!(file_name, "No text extracted from document");
                }
                text
            }
            Err(e) => {
                match &e {
                    ExtractionError::FileTooLarge { .. } | ExtractionError::PdfTooLarge { .. } => {
                        warn!(file_name, "{e}")
                    }
                    _ => error!(file_name, "Failed to extract document text: {e}"),
                }
                self.notifier.notify(
                    &e.to_string(),
                    Some(format!("File: {file_name}")),
                    e.alert_category(),
                );
                None
            }
        }
    }

    async fn try_extract(
        &self,
        platform: &dyn ChatPlatform,
        document: &Document,
    ) -> Result<Option<String>, ExtractionError> {
        self.check_size(document.file_size)?;

        let file = platform.get_file(&document.file_id).await?;
        self.check_size(file.file_size)?;

        let format = DocumentFormat::from_file_name(document.file_name.as_deref().unwrap_or(""));
        if matches!(format, DocumentFormat::Doc | DocumentFormat::Unsupported) {
            return Ok(None);
        }

        debug!(
            file_id = %document.file_id,
            mime_type = document.mime_type.as_deref().unwrap_or("unknown"),
            "Downloading document"
        );
        let bytes = platform.download_file(&file).await?;
        let max_pages = self.limits.max_pdf_pages;

        // A panicking parser surfaces here as a JoinError.
        tokio::task::spawn_blocking(move || extract_text(format, &bytes, max_pages))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
    }

    fn check_size(&self, reported: Option<u64>) -> Result<(), ExtractionError> {
        match reported {
            Some(size) if size > self.limits.max_file_size => Err(ExtractionError::FileTooLarge {
                size,
                max: self.limits.max_file_size,
            }),
            _ => Ok(()),
        }
    }
}
