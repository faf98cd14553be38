//! Error types for the pdf-chat library.
//!
//! Every stage returns [`PdfChatError`] for the one thing it was asked to do:
//! extract one document, run one prompt, export one response. None of these
//! failures is fatal to an interactive session. The chat loop and the
//! orchestrator report the message, log it, and hand control back to the
//! user, so a bad path or a crashed model never ends the program.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// All errors returned by the pdf-chat library.
#[derive(Debug, Error)]
pub enum PdfChatError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("The specified PDF file does not exist: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{}' (first bytes: {magic:?})", path.display())]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the document.
    #[error("PDF '{}' could not be opened: {detail}", path.display())]
    CorruptPdf { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// Text-layer extraction or rasterisation failed for a page.
    #[error("Extraction failed on page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// The OCR engine failed on a page.
    #[error("OCR failed on page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    // ── Process errors ────────────────────────────────────────────────────
    /// An external program could not be started at all.
    #[error("Failed to start '{program}': {source}")]
    CommandSpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The model command exited with a non-zero status.
    #[error("Model command failed ({status}):\n{stderr}")]
    ModelFailed { status: ExitStatus, stderr: String },

    /// The model command succeeded but printed nothing.
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The document converter exited with a non-zero status.
    #[error("Converter '{program}' failed ({status}): {stderr}")]
    ConverterFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    // ── Export errors ─────────────────────────────────────────────────────
    /// The spreadsheet could not be assembled.
    #[error("Failed to write spreadsheet: {0}")]
    SpreadsheetFailed(String),

    /// The requested export format is not one of txt/md/pptx/docx/xlsx.
    #[error("Invalid format selected: '{0}'")]
    InvalidFormat(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{}': {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Terminal or pipe I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
