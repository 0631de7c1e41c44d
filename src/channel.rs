use std::fmt::Display;
use std::io;

use colored::{Color, Colorize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const COMMAND_PROMPT: &str = "quiz > ";

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("the client closed the connection")]
    Closed,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Line-oriented conversation with one client.
///
/// Every read is preceded by a prompt, and at most one read is outstanding at a time
/// since all methods take `&mut self`.
pub struct Channel<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Channel<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub async fn write_line(&mut self, text: impl Display) -> Result<(), ChannelError> {
        self.writer.write_all(format!("{text}\n").as_bytes()).await?;
        Ok(())
    }

    pub async fn write_error(&mut self, text: impl Display) -> Result<(), ChannelError> {
        let line = format!("{} {}", "Error:".red(), text.to_string().red());
        self.write_line(line).await
    }

    /// Large-format rendering of a short text, used for verdicts and scores.
    pub async fn write_emphasized(&mut self, text: &str, color: Color) -> Result<(), ChannelError> {
        for line in banner(text) {
            self.write_line(line.color(color).bold()).await?;
        }
        Ok(())
    }

    /// Re-arms the command prompt.
    pub async fn prompt(&mut self) -> Result<(), ChannelError> {
        self.writer.write_all(COMMAND_PROMPT.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Reads the next command line. `None` means the client went away.
    pub async fn read_command(&mut self) -> Result<Option<String>, ChannelError> {
        match self.read_line().await {
            Ok(line) => Ok(Some(line)),
            Err(ChannelError::Closed) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Shows `text` and waits for the reply, trimmed.
    pub async fn prompt_line(&mut self, text: &str) -> Result<String, ChannelError> {
        self.writer.write_all(text.red().to_string().as_bytes()).await?;
        self.writer.flush().await?;
        Ok(self.read_line().await?.trim().to_string())
    }

    pub async fn close(&mut self) -> Result<(), ChannelError> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Bytes that are not UTF-8 (e.g. a Latin-1 terminal) are replaced, not rejected.
    async fn read_line(&mut self) -> Result<String, ChannelError> {
        let mut bytes = Vec::new();
        if self.reader.read_until(b'\n', &mut bytes).await? == 0 {
            return Err(ChannelError::Closed);
        }
        let mut line = String::from_utf8_lossy(&bytes).into_owned();
        let trimmed = line.trim_end_matches(&['\n', '\r'][..]).len();
        line.truncate(trimmed);
        Ok(line)
    }
}

fn banner(text: &str) -> Vec<String> {
    let spaced = text
        .to_uppercase()
        .chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ");
    let width = spaced.chars().count() + 4;
    let border = "═".repeat(width);
    vec![
        format!("╔{border}╗"),
        format!("║  {spaced}  ║"),
        format!("╚{border}╝"),
    ]
}
