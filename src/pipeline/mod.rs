//! Pipeline stages for PDF-to-Markdown extraction.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//!                ┌──▶ render (text layer) ──────────────┐
//! input ──▶ mode ┤                                      ├──▶ postprocess
//!  (path)        └──▶ render (PNG) ──▶ ocr (tesseract) ──┘     (Markdown)
//! ```
//!
//! 1. [`input`]  — validate the user-supplied path and derive the `.md` sibling
//! 2. [`render`] — pdfium text layer, or page rasterisation in `spawn_blocking`
//! 3. [`ocr`]    — one external OCR run per page image, in page order
//! 4. [`postprocess`] — deterministic plain-text → Markdown rules

pub mod input;
pub mod ocr;
pub mod postprocess;
pub mod render;
