//! # pdf-chat
//!
//! Chat with a PDF through a locally served language model.
//!
//! A document is turned into Markdown (from its text layer, or by OCR on
//! rendered pages), written next to the PDF as `<name>.md`, and handed to
//! the model as the first prompt. The user then chats about it; every
//! exchange is folded back into the prompt, and any answer can be exported
//! to txt, md, pptx, docx or xlsx.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    existence, permission and %PDF checks
//!  ├─ 2. Extract  pdfium text layer, or render → tesseract per page
//!  ├─ 3. Polish   line endings, HTML and Setext → Markdown, one block per page
//!  ├─ 4. Model    prompt on stdin of `ollama run llama3.2`, answer on stdout
//!  ├─ 5. Chat     context + turns, until "exit"
//!  └─ 6. Export   <base>.md, then pandoc or the built-in xlsx writer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_chat::{extract_to_markdown, CommandRunner, ModelRunner, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::default();
//!     let doc = extract_to_markdown("report.pdf", &config).await?;
//!     let runner = CommandRunner::new(config.model_command.clone());
//!     println!("{}", runner.run(&doc.markdown).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfchat` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod app;
pub mod chat;
pub mod config;
pub mod console;
pub mod error;
pub mod export;
pub mod extract;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod runner;
pub mod xlsx;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use app::{App, AppState, AppSummary, DocumentOutcome};
pub use chat::{ChatSession, ChatState, ChatSummary, Conversation, Turn};
pub use config::{ExportFormat, ExtractionMode, SessionConfig, SessionConfigBuilder, DEFAULT_MODEL};
pub use console::{Console, StdConsole};
pub use error::PdfChatError;
pub use export::{export_response, ExportReport};
pub use extract::{extract_to_markdown, ExtractedDocument};
pub use process::{CommandOutput, CommandSpec};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use runner::{CommandRunner, ModelRunner};
