//! Input resolution: turn a user-supplied path into a [`Document`].
//!
//! We validate the PDF magic bytes (`%PDF`) before returning so callers get a
//! meaningful error rather than an opaque pdfium failure.

use crate::config::ExtractionMode;
use crate::error::PdfChatError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source PDF plus how its text should be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub mode: ExtractionMode,
}

impl Document {
    /// The sibling Markdown file: same stem, `.md` extension.
    pub fn markdown_path(&self) -> PathBuf {
        markdown_sibling(&self.path)
    }
}

/// `<path-without-extension>.md`.
pub fn markdown_sibling(path: &Path) -> PathBuf {
    path.with_extension("md")
}

/// Resolve a local file path, validating existence, readability and PDF
/// magic bytes.
pub fn resolve_document(input: &str, mode: ExtractionMode) -> Result<Document, PdfChatError> {
    let path = PathBuf::from(input.trim());

    if !path.is_file() {
        return Err(PdfChatError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(PdfChatError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PdfChatError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(PdfChatError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(Document { path, mode })
}
