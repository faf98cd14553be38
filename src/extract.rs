//! Document extraction entry point.
//!
//! Opens a PDF, pulls the text of every page (text layer or OCR),
//! normalises it to Markdown and writes it next to the source as
//! `<stem>.md`. The caller gets the Markdown back in memory so it can be
//! used as the first prompt without re-reading the file.

use crate::config::{ExtractionMode, SessionConfig};
use crate::error::PdfChatError;
use crate::pipeline::input::{self, Document};
use crate::pipeline::{ocr, postprocess, render};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// The result of a successful extraction.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub document: Document,
    /// Where the Markdown was written.
    pub markdown_path: PathBuf,
    /// The Markdown that was written.
    pub markdown: String,
    pub page_count: usize,
    pub duration_ms: u64,
}

/// Extract a PDF to Markdown and write `<path-without-extension>.md`.
///
/// # Errors
/// - [`PdfChatError::FileNotFound`] when `input` is not an existing file;
///   nothing is written in that case.
/// - Any render, OCR or write failure for the document.
pub async fn extract_to_markdown(
    input_str: impl AsRef<str>,
    config: &SessionConfig,
) -> Result<ExtractedDocument, PdfChatError> {
    let start = Instant::now();
    let document = input::resolve_document(input_str.as_ref(), config.mode)?;
    info!(
        "Extracting {} ({:?})",
        document.path.display(),
        document.mode
    );

    let pages = match document.mode {
        ExtractionMode::TextLayer => {
            render::extract_text_layer(&document.path, config.progress_callback.clone()).await?
        }
        ExtractionMode::Ocr => extract_with_ocr(&document.path, config).await?,
    };
    let page_count = pages.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(page_count);
    }

    let markdown = postprocess::assemble_pages(&pages);
    let markdown_path = document.markdown_path();
    write_markdown(&markdown_path, &markdown).await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Wrote {} ({} pages, {} bytes) in {}ms",
        markdown_path.display(),
        page_count,
        markdown.len(),
        duration_ms
    );

    Ok(ExtractedDocument {
        document,
        markdown_path,
        markdown,
        page_count,
        duration_ms,
    })
}

/// Rasterise into a scratch directory, then recognise page by page.
///
/// The directory and its PNGs are removed when this returns.
async fn extract_with_ocr(
    pdf_path: &Path,
    config: &SessionConfig,
) -> Result<Vec<String>, PdfChatError> {
    let scratch = tempfile::tempdir()?;
    let images = render::render_pages_to_png(
        pdf_path,
        scratch.path(),
        config.dpi,
        config.max_rendered_pixels,
    )
    .await?;
    debug!("Rendered {} page images into {}", images.len(), scratch.path().display());

    ocr::recognise_pages(config, &images).await
}

/// Atomic write: write to a temp sibling, then rename over the target.
///
/// The temp file is removed again if either step fails.
async fn write_markdown(path: &Path, markdown: &str) -> Result<(), PdfChatError> {
    let tmp_path = path.with_extension("md.tmp");
    let written = match tokio::fs::write(&tmp_path, markdown).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };

    written.map_err(|source| {
        if let Err(e) = std::fs::remove_file(&tmp_path) {
            debug!("Could not remove {}: {}", tmp_path.display(), e);
        }
        PdfChatError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        }
    })
}
