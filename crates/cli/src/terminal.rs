use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use docchat_monitor::SessionSummary;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const USER_PROMPT: Color = Color::Green;
    const ASSISTANT_TEXT: Color = Color::Cyan;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// One read from the user.
#[derive(Debug, PartialEq)]
pub enum Input {
    /// A trimmed line.
    Line(String),
    /// stdin closed.
    Eof,
    /// Ctrl+C while waiting for input.
    Interrupted,
}

/// Terminal I/O for the chat loop.
pub struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print the startup banner.
    pub fn print_banner(&self, llm_url: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("docchat"),
            ResetColor,
            Print(" - chat with your documents\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("LLM: {}\n", llm_url)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print the chat instructions shown once the session starts.
    pub fn print_chat_header(&self) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print("\nStarting chat (type 'exit' to quit, 'clear' to clear context, 'stats' for metrics)\n"),
            Print(format!("{}\n", "=".repeat(50))),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Show `prompt` and wait for a line, EOF or Ctrl+C.
    pub async fn read_input(&mut self, prompt: &str) -> Result<Input> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::USER_PROMPT),
            Print(prompt),
            ResetColor,
        )?;
        stdout.flush()?;

        tokio::select! {
            line = self.lines.next_line() => Ok(match line? {
                Some(text) => Input::Line(text.trim().to_string()),
                None => Input::Eof,
            }),
            _ = tokio::signal::ctrl_c() => Ok(Input::Interrupted),
        }
    }

    /// Print the assistant's reply.
    pub fn print_reply(&self, reply: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::ASSISTANT_TEXT),
            Print("Assistant: "),
            ResetColor,
            Print(format!("{}\n", reply)),
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", "-".repeat(50))),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_stats(&self, summary: &SessionSummary) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("\nCurrent Metrics:\n"),
            ResetColor,
            Print(format_stats(summary)),
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ERROR),
            Print(format!("\nError: {}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an info message.
    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

/// The `stats` report, one metric per line.
pub fn format_stats(summary: &SessionSummary) -> String {
    format!(
        "Total Queries: {}\n\
         Average Response Time: {:.2}s\n\
         Total Characters: {}\n\
         Average Characters per Query: {:.1}\n\
         Errors: {}\n\
         Memory Usage: {:.1} MB\n\
         Session Duration: {:.1}s\n",
        summary.total_queries,
        summary.avg_inference_time,
        summary.total_chars,
        summary.avg_chars_per_query,
        summary.errors,
        summary.current_memory_usage_mb,
        summary.session_duration,
    )
}
