//! pdfium access: text-layer extraction and page rasterisation.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! runtime thread never stalls inside pdfium.
//!
//! Pages are always visited in document order, one at a time.

use crate::error::PdfChatError;
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bind to a pdfium shared library.
///
/// Lookup order: `PDFIUM_LIB_PATH` (full path to the library file), the
/// current working directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, PdfChatError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PdfChatError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, PdfChatError> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| PdfChatError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

/// Read the embedded text layer of every page, in order.
pub async fn extract_text_layer(
    pdf_path: &Path,
    progress: Option<ProgressCallback>,
) -> Result<Vec<String>, PdfChatError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || extract_text_layer_blocking(&path, progress.as_ref()))
        .await
        .map_err(|e| PdfChatError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Blocking implementation of text-layer extraction.
fn extract_text_layer_blocking(
    pdf_path: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<String>, PdfChatError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);
    if let Some(cb) = progress {
        cb.on_extraction_start(total_pages);
    }

    let mut texts = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let text = match page.text() {
            Ok(text) => text.all(),
            Err(e) => {
                let detail = format!("{:?}", e);
                if let Some(cb) = progress {
                    cb.on_page_error(page_num, total_pages, &detail);
                }
                return Err(PdfChatError::ExtractionFailed {
                    page: page_num,
                    detail,
                });
            }
        };
        debug!("Page {}: {} chars of text", page_num, text.len());
        texts.push(text);
        if let Some(cb) = progress {
            cb.on_page_complete(page_num, total_pages);
        }
    }

    Ok(texts)
}

/// Rasterise every page to `page-NNNN.png` inside `out_dir`, in order.
///
/// Returns the image paths in page order.
pub async fn render_pages_to_png(
    pdf_path: &Path,
    out_dir: &Path,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<PathBuf>, PdfChatError> {
    let path = pdf_path.to_path_buf();
    let dir = out_dir.to_path_buf();

    tokio::task::spawn_blocking(move || render_pages_blocking(&path, &dir, dpi, max_pixels))
        .await
        .map_err(|e| PdfChatError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    out_dir: &Path,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<PathBuf>, PdfChatError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path)?;

    let pages = document.pages();
    info!("Rendering {} pages at {} DPI", pages.len(), dpi);

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut images = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            PdfChatError::ExtractionFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        let file = out_dir.join(format!("page-{:04}.png", page_num));
        image
            .save_with_format(&file, image::ImageFormat::Png)
            .map_err(|e| PdfChatError::ExtractionFailed {
                page: page_num,
                detail: format!("PNG encoding failed: {}", e),
            })?;

        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        images.push(file);
    }

    Ok(images)
}
