//! External program execution with argument vectors.
//!
//! The model runner, the OCR engine and the document converter are all
//! opaque collaborators reached through a subprocess. They share this one
//! entry point: the program and its arguments are passed straight to the OS,
//! never through a shell, so nothing in a prompt or a file name is ever
//! interpreted as shell syntax. Optional input is streamed to the child's
//! stdin while its stdout and stderr are captured.
//!
//! There is no timeout. A child that never exits blocks the caller until it
//! is killed from outside.

use crate::error::PdfChatError;
use std::fmt;
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// A program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run to completion, optionally feeding `stdin`.
    ///
    /// A non-zero exit is *not* an error here; callers decide what a failed
    /// status means for them. Only a failure to start the program, or a
    /// broken pipe while collecting output, is returned as `Err`.
    pub async fn run(&self, stdin: Option<&[u8]>) -> Result<CommandOutput, PdfChatError> {
        debug!("Running {} ({} stdin bytes)", self, stdin.map_or(0, <[u8]>::len));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| PdfChatError::CommandSpawnFailed {
                program: self.program.clone(),
                source,
            })?;

        let output = match (stdin, child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => {
                // Writing and draining run together so a chatty child cannot
                // fill its stdout pipe while we are still writing its input.
                let feed = async move {
                    let written = match pipe.write_all(bytes).await {
                        // The child stopped reading; its exit status tells the rest.
                        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                        other => other,
                    };
                    drop(pipe);
                    written
                };
                let (fed, output) = tokio::join!(feed, child.wait_with_output());
                fed?;
                output?
            }
            _ => child.wait_with_output().await?,
        };

        debug!(
            "{} exited with {} ({} stdout bytes, {} stderr bytes)",
            self.program,
            output.status,
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(CommandOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
