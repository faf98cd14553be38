//! Model invocation: hand a prompt to a locally served language model.
//!
//! The model is an opaque collaborator behind a command line (by default
//! `ollama run llama3.2`). The prompt goes in on stdin, the answer comes back
//! on stdout, and the call blocks until the process exits. There is no retry
//! and no timeout.
//!
//! [`ModelRunner`] is the seam the chat loop depends on, so tests and the
//! CLI's spinner wrapper can stand in for the real process.

use crate::error::PdfChatError;
use crate::process::CommandSpec;
use std::time::Instant;
use tracing::{debug, warn};

/// Anything that turns a prompt into a model response.
#[allow(async_fn_in_trait)]
pub trait ModelRunner {
    /// Run one prompt to completion.
    ///
    /// # Errors
    /// [`PdfChatError::ModelFailed`] on a non-zero exit (with the captured
    /// stderr), [`PdfChatError::EmptyResponse`] when nothing but whitespace
    /// was produced, [`PdfChatError::CommandSpawnFailed`] when the runner
    /// could not be started.
    async fn run(&self, prompt: &str) -> Result<String, PdfChatError>;
}

/// Runs the model as an external command with the prompt piped to stdin.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    command: CommandSpec,
}

impl CommandRunner {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl ModelRunner for CommandRunner {
    async fn run(&self, prompt: &str) -> Result<String, PdfChatError> {
        let start = Instant::now();
        let output = self.command.run(Some(prompt.as_bytes())).await?;

        if !output.success() {
            let stderr = output.stderr_lossy();
            warn!("{} exited with {}", self.command.program, output.status);
            return Err(PdfChatError::ModelFailed {
                status: output.status,
                stderr,
            });
        }

        let response = output.stdout_lossy();
        debug!(
            "Model answered {} bytes for a {} byte prompt in {:?}",
            response.len(),
            prompt.len(),
            start.elapsed()
        );

        if response.trim().is_empty() {
            return Err(PdfChatError::EmptyResponse);
        }
        Ok(response)
    }
}
