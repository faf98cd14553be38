//! The interactive chat loop over one document.
//!
//! A session is a two-state machine:
//!
//! ```text
//!            any other line ──▶ model call ──▶ print ──▶ offer export
//!                 ▲                                          │
//!                 └──────────── AwaitingInput ◀──────────────┘
//!                                    │
//!                       "exit" / end of input
//!                                    ▼
//!                               Terminated
//! ```
//!
//! The [`Conversation`] is owned by the session and dropped with it. Each
//! prompt is the document text plus every completed exchange plus the new
//! user line, so the model sees the whole chat so far.

use crate::config::{ExportFormat, SessionConfig};
use crate::console::Console;
use crate::error::PdfChatError;
use crate::export;
use crate::prompts;
use crate::runner::ModelRunner;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, warn};

/// One completed user/model exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub response: String,
}

/// The growing prompt: document text plus completed exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    context: String,
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            turns: Vec::new(),
        }
    }

    /// The initial document text.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The full prompt for a new user line.
    pub fn prompt_for(&self, user_input: &str) -> String {
        let mut prompt = self.context.clone();
        for turn in &self.turns {
            prompts::push_turn(&mut prompt, &turn.user, &turn.response);
        }
        prompts::push_pending_turn(&mut prompt, user_input);
        prompt
    }

    /// Remember a successful exchange.
    pub fn record(&mut self, user_input: impl Into<String>, response: impl Into<String>) {
        self.turns.push(Turn {
            user: user_input.into(),
            response: response.into(),
        });
    }
}

/// Where a chat session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    AwaitingInput,
    Terminated,
}

/// Totals for a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatSummary {
    /// Exchanges that produced a response.
    pub turns: usize,
    /// Exports that completed.
    pub exports: usize,
}

/// A chat about one document.
pub struct ChatSession<'a, M> {
    runner: &'a M,
    config: &'a SessionConfig,
    conversation: Conversation,
    state: ChatState,
    summary: ChatSummary,
}

impl<'a, M: ModelRunner> ChatSession<'a, M> {
    pub fn new(runner: &'a M, config: &'a SessionConfig, context: impl Into<String>) -> Self {
        Self {
            runner,
            config,
            conversation: Conversation::new(context),
            state: ChatState::AwaitingInput,
            summary: ChatSummary::default(),
        }
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Drive the session until it terminates.
    ///
    /// Only a failure of the console itself is returned as `Err`; model and
    /// export failures are printed and the loop goes on.
    pub async fn run<R, W>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<ChatSummary, PdfChatError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        while self.state == ChatState::AwaitingInput {
            self.step(console).await?;
        }
        Ok(self.summary)
    }

    /// Handle one line of user input.
    pub async fn step<R, W>(&mut self, console: &mut Console<R, W>) -> Result<ChatState, PdfChatError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if self.state == ChatState::Terminated {
            return Ok(self.state);
        }

        let input = match console.prompt(prompts::CHAT_PROMPT).await? {
            Some(line) if !prompts::is_exit(&line) => line,
            _ => {
                console.say(prompts::CHAT_EXIT_MESSAGE).await?;
                self.state = ChatState::Terminated;
                return Ok(self.state);
            }
        };

        let prompt = self.conversation.prompt_for(&input);
        debug!("Chat turn {}: {} byte prompt", self.summary.turns + 1, prompt.len());

        match self.runner.run(&prompt).await {
            Ok(response) => {
                print_response(console, &response).await?;
                self.conversation.record(input, response.as_str());
                self.summary.turns += 1;
                if self.offer_export(console, &response).await? {
                    self.summary.exports += 1;
                }
            }
            Err(e) => report_model_error(console, &e).await?,
        }

        console.say(&prompts::turn_separator()).await?;
        Ok(self.state)
    }

    /// Ask whether to export `response`; returns whether an export completed.
    async fn offer_export<R, W>(
        &self,
        console: &mut Console<R, W>,
        response: &str,
    ) -> Result<bool, PdfChatError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let wants_export = console
            .prompt(prompts::EXPORT_QUESTION)
            .await?
            .is_some_and(|answer| answer.trim().eq_ignore_ascii_case(prompts::YES));
        if !wants_export {
            return Ok(false);
        }

        let Some(base_name) = console.prompt(prompts::EXPORT_BASE_NAME_PROMPT).await? else {
            return Ok(false);
        };
        let Some(choice) = console.prompt(prompts::EXPORT_FORMAT_PROMPT).await? else {
            return Ok(false);
        };

        let format = match choice.parse::<ExportFormat>() {
            Ok(format) => format,
            Err(_) => {
                console.say(prompts::INVALID_FORMAT_MESSAGE).await?;
                return Ok(false);
            }
        };

        let base_name = base_name.trim();
        if base_name.is_empty() {
            console.say("No base name given; nothing was saved.").await?;
            return Ok(false);
        }

        match export::export_response(response, base_name, format, self.config).await {
            Ok(report) => {
                console
                    .say(&format!("Converted to {}", report.artifact_path.display()))
                    .await?;
                Ok(true)
            }
            Err(e) => {
                warn!("Export to {} failed: {}", format, e);
                console
                    .say(&format!("Error converting to {}: {}", format, e))
                    .await?;
                Ok(false)
            }
        }
    }
}

/// Print a model response under its heading.
pub(crate) async fn print_response<R, W>(
    console: &mut Console<R, W>,
    response: &str,
) -> Result<(), PdfChatError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    console
        .say(&format!("{}\n{}", prompts::MODEL_OUTPUT_HEADING, response))
        .await?;
    Ok(())
}

/// Tell the user a model call failed; stderr is shown verbatim.
pub(crate) async fn report_model_error<R, W>(
    console: &mut Console<R, W>,
    error: &PdfChatError,
) -> Result<(), PdfChatError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    warn!("Model call failed: {}", error);
    let detail = match error {
        PdfChatError::ModelFailed { stderr, .. } => stderr.trim_end().to_string(),
        other => other.to_string(),
    };
    console
        .say(&format!("{}\n{}", prompts::MODEL_ERROR_HEADING, detail))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned replies and records every prompt it was given.
    struct ScriptedRunner {
        replies: RefCell<VecDeque<Result<String, PdfChatError>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(replies: Vec<Result<String, PdfChatError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModelRunner for ScriptedRunner {
        async fn run(&self, prompt: &str) -> Result<String, PdfChatError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(PdfChatError::EmptyResponse))
        }
    }

    fn console(input: &'static str) -> Console<&'static [u8], Vec<u8>> {
        Console::new(input.as_bytes(), Vec::new())
    }

    fn printed(console: Console<&'static [u8], Vec<u8>>) -> String {
        String::from_utf8(console.into_inner().1).unwrap()
    }

    #[test]
    fn prompt_accumulates_turns() {
        let mut conv = Conversation::new("DOC");
        assert_eq!(conv.prompt_for("q1"), "DOC\nUser: q1\nModel:");
        conv.record("q1", "a1");
        assert_eq!(conv.prompt_for("q2"), "DOC\nUser: q1\nModel: a1\nUser: q2\nModel:");
        assert_eq!(conv.context(), "DOC");
    }

    #[tokio::test]
    async fn exit_first_calls_nothing() {
        let runner = ScriptedRunner::new(vec![]);
        let config = SessionConfig::default();
        let mut session = ChatSession::new(&runner, &config, "DOC");
        let mut io = console("EXIT\n");

        let summary = session.run(&mut io).await.unwrap();

        assert_eq!(summary, ChatSummary::default());
        assert_eq!(session.state(), ChatState::Terminated);
        assert!(runner.prompts.borrow().is_empty());
        assert_eq!(session.conversation(), &Conversation::new("DOC"));
        assert!(printed(io).contains(prompts::CHAT_EXIT_MESSAGE));
    }

    #[tokio::test]
    async fn end_of_input_terminates() {
        let runner = ScriptedRunner::new(vec![]);
        let config = SessionConfig::default();
        let mut session = ChatSession::new(&runner, &config, "DOC");
        let mut io = console("");

        session.run(&mut io).await.unwrap();
        assert_eq!(session.state(), ChatState::Terminated);
    }

    #[tokio::test]
    async fn non_utf8_question_reaches_model() {
        let runner = ScriptedRunner::new(vec![Ok("ok".into())]);
        let config = SessionConfig::default();
        let mut session = ChatSession::new(&runner, &config, "DOC");
        let mut io = Console::new(&b"r\xe9sum\xe9\nno\nexit\n"[..], Vec::new());

        let summary = session.run(&mut io).await.unwrap();

        assert_eq!(summary.turns, 1);
        assert_eq!(
            runner.prompts.borrow()[0],
            "DOC\nUser: r\u{FFFD}sum\u{FFFD}\nModel:"
        );
    }

    #[tokio::test]
    async fn second_turn_sees_first_exchange() {
        let runner = ScriptedRunner::new(vec![Ok("A1".into()), Ok("A2".into())]);
        let config = SessionConfig::default();
        let mut session = ChatSession::new(&runner, &config, "DOC");
        let mut io = console("q1\nno\nq2\nno\nexit\n");

        let summary = session.run(&mut io).await.unwrap();

        assert_eq!(summary.turns, 2);
        let prompts = runner.prompts.borrow();
        assert_eq!(prompts[0], "DOC\nUser: q1\nModel:");
        assert_eq!(prompts[1], "DOC\nUser: q1\nModel: A1\nUser: q2\nModel:");
        let out = printed(io);
        assert!(out.contains("Model Output:\nA1"));
        assert!(out.contains("Model Output:\nA2"));
    }

    #[tokio::test]
    async fn failed_turn_is_not_recorded_and_skips_export() {
        let runner = ScriptedRunner::new(vec![Err(PdfChatError::EmptyResponse), Ok("A2".into())]);
        let config = SessionConfig::default();
        let mut session = ChatSession::new(&runner, &config, "DOC");
        // No export answer after the failed turn: the next line is the next question.
        let mut io = console("q1\nq2\nno\nexit\n");

        let summary = session.run(&mut io).await.unwrap();

        assert_eq!(summary.turns, 1);
        assert_eq!(runner.prompts.borrow()[1], "DOC\nUser: q2\nModel:");
        assert!(printed(io).contains(prompts::MODEL_ERROR_HEADING));
    }

    #[tokio::test]
    async fn invalid_format_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out");
        let script = format!("q\nYES\n{}\npdf\nexit\n", base.display());
        let runner = ScriptedRunner::new(vec![Ok("answer".into())]);
        let config = SessionConfig::default();
        let mut session = ChatSession::new(&runner, &config, "DOC");
        let mut io = Console::new(script.as_bytes(), Vec::new());

        let summary = session.run(&mut io).await.unwrap();

        assert_eq!(summary.exports, 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        let out = String::from_utf8(io.into_inner().1).unwrap();
        assert!(out.contains(prompts::INVALID_FORMAT_MESSAGE));
    }

    #[tokio::test]
    async fn yes_exports_latest_response_only() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("second");
        let script = format!("q1\nno\nq2\nyes\n{}\nxlsx\nexit\n", base.display());
        let runner = ScriptedRunner::new(vec![Ok("first".into()), Ok("second".into())]);
        let config = SessionConfig::default();
        let mut session = ChatSession::new(&runner, &config, "DOC");
        let mut io = Console::new(script.as_bytes(), Vec::new());

        let summary = session.run(&mut io).await.unwrap();

        assert_eq!(summary.exports, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("second.md")).unwrap(),
            "second"
        );
        assert!(dir.path().join("second.xlsx").exists());
    }
}
