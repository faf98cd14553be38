//! Line-oriented terminal I/O for the interactive loops.
//!
//! The chat loop and the orchestrator never touch stdin/stdout directly;
//! they go through a [`Console`] so tests can script the user's answers and
//! capture everything that would have been printed.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

/// A prompt/print pair over any async reader and writer.
pub struct Console<R, W> {
    reader: R,
    writer: W,
}

/// The process's own terminal.
pub type StdConsole = Console<BufReader<Stdin>, Stdout>;

impl StdConsole {
    pub fn stdio() -> Self {
        Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Print `label` without a newline and read one line of input.
    ///
    /// Returns `None` at end of input. The trailing line terminator is
    /// removed; everything else is returned as typed, with bytes that are
    /// not UTF-8 replaced by U+FFFD.
    pub async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        self.writer.write_all(label.as_bytes()).await?;
        self.writer.flush().await?;

        let mut raw = Vec::new();
        if self.reader.read_until(b'\n', &mut raw).await? == 0 {
            return Ok(None);
        }
        let mut line = String::from_utf8_lossy(&raw).into_owned();
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Print `text` followed by a newline.
    pub async fn say(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Give back the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}
