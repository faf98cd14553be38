//! Configuration types for a document chat session.
//!
//! Every knob the pipeline reads lives in [`SessionConfig`], built through
//! [`SessionConfigBuilder`] so callers only set what they care about and get
//! documented defaults for the rest.

use crate::error::PdfChatError;
use crate::process::CommandSpec;
use crate::progress::ProgressCallback;
use std::fmt;
use std::str::FromStr;

/// Default model served by the local runner.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Configuration for extraction, model invocation and export.
///
/// # Example
/// ```rust
/// use pdf_chat::{ExtractionMode, SessionConfig};
///
/// let config = SessionConfig::builder()
///     .mode(ExtractionMode::Ocr)
///     .ocr_language("deu")
///     .build()
///     .unwrap();
/// assert_eq!(config.mode, ExtractionMode::Ocr);
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    /// Text-layer or OCR extraction. Default: [`ExtractionMode::TextLayer`].
    pub mode: ExtractionMode,

    /// Command that reads a prompt on stdin and prints the model's answer.
    /// Default: `ollama run llama3.2`.
    pub model_command: CommandSpec,

    /// Document converter used for txt/pptx/docx exports. Default: `pandoc`.
    ///
    /// Invoked as `<program> <base>.md -o <base>.<ext>`.
    pub converter_program: String,

    /// OCR engine binary. Default: `tesseract`.
    ///
    /// Invoked as `<program> <page.png> stdout -l <language>`.
    pub ocr_program: String,

    /// OCR language code passed to the engine. Default: `eng`.
    pub ocr_language: String,

    /// Rendering DPI for OCR rasterisation. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Cap on either rendered page dimension in pixels. Default: 2000.
    ///
    /// Keeps poster-sized pages from allocating enormous bitmaps.
    pub max_rendered_pixels: u32,

    /// Optional per-page progress events during extraction.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::default(),
            model_command: CommandSpec::new("ollama").args(["run", DEFAULT_MODEL]),
            converter_program: "pandoc".to_string(),
            ocr_program: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            dpi: 150,
            max_rendered_pixels: 2000,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("mode", &self.mode)
            .field("model_command", &self.model_command)
            .field("converter_program", &self.converter_program)
            .field("ocr_program", &self.ocr_program)
            .field("ocr_language", &self.ocr_language)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SessionConfig`].
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn mode(mut self, mode: ExtractionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn ocr(mut self, enabled: bool) -> Self {
        self.config.mode = ExtractionMode::from_ocr_flag(enabled);
        self
    }

    pub fn model_command(mut self, command: CommandSpec) -> Self {
        self.config.model_command = command;
        self
    }

    pub fn converter_program(mut self, program: impl Into<String>) -> Self {
        self.config.converter_program = program.into();
        self
    }

    pub fn ocr_program(mut self, program: impl Into<String>) -> Self {
        self.config.ocr_program = program.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, PdfChatError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(PdfChatError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.max_rendered_pixels < 100 {
            return Err(PdfChatError::InvalidConfig(format!(
                "Maximum rendered size must be at least 100 pixels, got {}",
                c.max_rendered_pixels
            )));
        }
        if c.model_command.program.trim().is_empty() {
            return Err(PdfChatError::InvalidConfig(
                "Model command must not be empty".into(),
            ));
        }
        if c.converter_program.trim().is_empty() {
            return Err(PdfChatError::InvalidConfig(
                "Converter program must not be empty".into(),
            ));
        }
        if c.ocr_program.trim().is_empty() || c.ocr_language.trim().is_empty() {
            return Err(PdfChatError::InvalidConfig(
                "OCR program and language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where page text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// Read the embedded text layer of each page. (default)
    #[default]
    TextLayer,
    /// Rasterise each page and run optical character recognition on it.
    Ocr,
}

impl ExtractionMode {
    pub fn from_ocr_flag(ocr: bool) -> Self {
        if ocr {
            ExtractionMode::Ocr
        } else {
            ExtractionMode::TextLayer
        }
    }
}

/// Output formats a model response can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Md,
    Pptx,
    Docx,
    Xlsx,
}

impl ExportFormat {
    /// Every supported format, in menu order.
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Txt,
        ExportFormat::Md,
        ExportFormat::Pptx,
        ExportFormat::Docx,
        ExportFormat::Xlsx,
    ];

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Md => "md",
            ExportFormat::Pptx => "pptx",
            ExportFormat::Docx => "docx",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// Whether the external converter produces this format. `md` is the
    /// Markdown copy itself and `xlsx` is written in-process.
    pub fn is_delegated(self) -> bool {
        matches!(self, ExportFormat::Txt | ExportFormat::Pptx | ExportFormat::Docx)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = PdfChatError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.extension() == tag)
            .ok_or_else(|| PdfChatError::InvalidFormat(s.trim().to_string()))
    }
}
