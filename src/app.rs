//! Orchestrator: documents in, chat sessions out.
//!
//! The documents named on the command line are processed first, in order.
//! After that the app keeps asking for another document path until the user
//! types `exit` or input ends. Each document goes through
//! extract → first model call → chat session; a failure at any stage is
//! reported and the app moves on to the next document.

use crate::chat::{self, ChatSession, ChatSummary};
use crate::config::SessionConfig;
use crate::console::Console;
use crate::error::PdfChatError;
use crate::extract::extract_to_markdown;
use crate::prompts;
use crate::runner::ModelRunner;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{info, warn};

/// Where the orchestrator is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Working through the paths given at start-up; holds the next index.
    InitialDocuments(usize),
    /// Waiting for the user to name a document.
    AwaitingDocument,
    Terminated,
}

/// What happened to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Extraction failed; no model call, no chat.
    Skipped,
    /// A chat session ran over the document.
    Chatted(ChatSummary),
}

/// Totals for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppSummary {
    pub documents_chatted: usize,
    pub documents_skipped: usize,
}

impl AppSummary {
    fn record(&mut self, outcome: DocumentOutcome) {
        match outcome {
            DocumentOutcome::Skipped => self.documents_skipped += 1,
            DocumentOutcome::Chatted(_) => self.documents_chatted += 1,
        }
    }
}

/// The interactive program over a configuration and a model.
pub struct App<M> {
    config: SessionConfig,
    runner: M,
}

impl<M: ModelRunner> App<M> {
    pub fn new(config: SessionConfig, runner: M) -> Self {
        Self { config, runner }
    }

    pub fn runner(&self) -> &M {
        &self.runner
    }

    /// Process `initial_paths`, then prompt for more documents until exit.
    ///
    /// Only console failures are returned as `Err`.
    pub async fn run<R, W>(
        &self,
        console: &mut Console<R, W>,
        initial_paths: &[String],
    ) -> Result<AppSummary, PdfChatError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut summary = AppSummary::default();
        let mut state = AppState::InitialDocuments(0);

        loop {
            state = match state {
                AppState::InitialDocuments(i) => match initial_paths.get(i) {
                    Some(path) => {
                        summary.record(self.process_document(console, path).await?);
                        AppState::InitialDocuments(i + 1)
                    }
                    None => AppState::AwaitingDocument,
                },
                AppState::AwaitingDocument => match console.prompt(prompts::DOCUMENT_PROMPT).await? {
                    Some(path) if !prompts::is_exit(&path) => {
                        summary.record(self.process_document(console, &path).await?);
                        AppState::AwaitingDocument
                    }
                    _ => {
                        console.say(prompts::PROGRAM_EXIT_MESSAGE).await?;
                        AppState::Terminated
                    }
                },
                AppState::Terminated => break,
            };
        }

        info!(
            "Session finished: {} documents chatted, {} skipped",
            summary.documents_chatted, summary.documents_skipped
        );
        Ok(summary)
    }

    /// Extract one document, send it to the model and chat about it.
    pub async fn process_document<R, W>(
        &self,
        console: &mut Console<R, W>,
        path: &str,
    ) -> Result<DocumentOutcome, PdfChatError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let extracted = match extract_to_markdown(path, &self.config).await {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("Skipping {}: {}", path, e);
                let message = match &e {
                    PdfChatError::FileNotFound { .. } => e.to_string(),
                    _ => format!("Error processing {}: {}", path.trim(), e),
                };
                console.say(&message).await?;
                return Ok(DocumentOutcome::Skipped);
            }
        };
        console
            .say(&format!(
                "Markdown file created: {}",
                extracted.markdown_path.display()
            ))
            .await?;

        console.say(prompts::INITIAL_PROMPT_SENT).await?;
        match self.runner.run(&extracted.markdown).await {
            Ok(response) => chat::print_response(console, &response).await?,
            Err(e) => chat::report_model_error(console, &e).await?,
        }

        console.say(&prompts::session_separator()).await?;
        let mut session = ChatSession::new(&self.runner, &self.config, extracted.markdown);
        let chat_summary = session.run(console).await?;
        console.say(&prompts::session_separator()).await?;

        Ok(DocumentOutcome::Chatted(chat_summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Answers every prompt with its length and counts calls.
    #[derive(Default)]
    struct CountingRunner {
        calls: RefCell<usize>,
    }

    impl ModelRunner for CountingRunner {
        async fn run(&self, prompt: &str) -> Result<String, PdfChatError> {
            *self.calls.borrow_mut() += 1;
            Ok(format!("{} bytes", prompt.len()))
        }
    }

    #[tokio::test]
    async fn exit_immediately() {
        let app = App::new(SessionConfig::default(), CountingRunner::default());
        let mut console = Console::new(&b"exit\n"[..], Vec::new());

        let summary = app.run(&mut console, &[]).await.unwrap();

        assert_eq!(summary, AppSummary::default());
        let out = String::from_utf8(console.into_inner().1).unwrap();
        assert!(out.starts_with(prompts::DOCUMENT_PROMPT));
        assert!(out.ends_with("Exiting the program.\n"));
    }

    #[tokio::test]
    async fn end_of_input_exits_program() {
        let app = App::new(SessionConfig::default(), CountingRunner::default());
        let mut console = Console::new(&b""[..], Vec::new());

        app.run(&mut console, &[]).await.unwrap();

        let out = String::from_utf8(console.into_inner().1).unwrap();
        assert!(out.contains(prompts::PROGRAM_EXIT_MESSAGE));
    }

    #[tokio::test]
    async fn missing_documents_are_skipped_and_loop_continues() {
        let dir = tempfile::tempdir().unwrap();
        let initial = dir.path().join("first.pdf").to_string_lossy().into_owned();
        let typed = dir.path().join("second.pdf").to_string_lossy().into_owned();
        let script = format!("{typed}\nEXIT\n");
        let app = App::new(SessionConfig::default(), CountingRunner::default());
        let mut console = Console::new(script.as_bytes(), Vec::new());

        let summary = app.run(&mut console, &[initial.clone()]).await.unwrap();

        assert_eq!(summary.documents_skipped, 2);
        assert_eq!(*app.runner().calls.borrow(), 0);
        let out = String::from_utf8(console.into_inner().1).unwrap();
        assert!(out.contains(&format!("The specified PDF file does not exist: {initial}")));
        assert!(out.contains(&format!("The specified PDF file does not exist: {typed}")));
    }

    #[tokio::test]
    async fn non_utf8_path_is_reported_and_loop_continues() {
        let app = App::new(SessionConfig::default(), CountingRunner::default());
        let mut console = Console::new(&b"caf\xe9.pdf\nexit\n"[..], Vec::new());

        let summary = app.run(&mut console, &[]).await.unwrap();

        assert_eq!(summary.documents_skipped, 1);
        let out = String::from_utf8(console.into_inner().1).unwrap();
        assert!(out.contains("The specified PDF file does not exist: caf\u{FFFD}.pdf"));
        assert!(out.ends_with("Exiting the program.\n"));
    }

    #[tokio::test]
    async fn non_pdf_is_reported_as_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.pdf");
        std::fs::write(&notes, "plain text").unwrap();
        let app = App::new(SessionConfig::default(), CountingRunner::default());
        let mut console = Console::new(&b""[..], Vec::new());

        let outcome = app
            .process_document(&mut console, notes.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(outcome, DocumentOutcome::Skipped);
        assert!(!dir.path().join("notes.md").exists());
        let out = String::from_utf8(console.into_inner().1).unwrap();
        assert!(out.contains("Error processing"));
    }
}
