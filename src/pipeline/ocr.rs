//! Optical character recognition through an external engine.
//!
//! Each rendered page image is recognised independently by running
//! `<program> <image> stdout -l <language>` (tesseract's command line) and
//! collecting what it prints. Pages run strictly one after another.

use crate::config::SessionConfig;
use crate::error::PdfChatError;
use crate::process::CommandSpec;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The command line used to recognise one page image.
pub fn ocr_command(config: &SessionConfig, image: &Path) -> CommandSpec {
    CommandSpec::new(&config.ocr_program)
        .arg(image.to_string_lossy())
        .args(["stdout", "-l", config.ocr_language.as_str()])
}

/// Recognise a single page image.
pub async fn recognise_page(
    config: &SessionConfig,
    page_num: usize,
    image: &Path,
) -> Result<String, PdfChatError> {
    let output = ocr_command(config, image).run(None).await?;

    if !output.success() {
        let stderr = output.stderr_lossy();
        warn!("OCR engine failed on page {}: {}", page_num, stderr.trim());
        return Err(PdfChatError::OcrFailed {
            page: page_num,
            detail: format!("{} exited with {}: {}", config.ocr_program, output.status, stderr.trim()),
        });
    }

    let text = output.stdout_lossy();
    debug!("Page {}: recognised {} chars", page_num, text.len());
    Ok(text)
}

/// Recognise every image in order, reporting progress per page.
pub async fn recognise_pages(
    config: &SessionConfig,
    images: &[PathBuf],
) -> Result<Vec<String>, PdfChatError> {
    let total_pages = images.len();
    info!("Running OCR on {} pages", total_pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total_pages);
    }

    let mut texts = Vec::with_capacity(total_pages);
    for (idx, image) in images.iter().enumerate() {
        let page_num = idx + 1;
        match recognise_page(config, page_num, image).await {
            Ok(text) => {
                texts.push(text);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, total_pages);
                }
            }
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total_pages, &e.to_string());
                }
                return Err(e);
            }
        }
    }

    Ok(texts)
}
