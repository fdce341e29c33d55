//! Operator input: the terminal, or a prepared list of lines.

use std::collections::VecDeque;
use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Outcome of waiting for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    Line(String),
    /// No more input will come.
    Eof,
    /// The operator pressed Ctrl-C.
    Interrupted,
}

/// Source of operator lines.
#[async_trait]
pub trait LineReader: Send {
    /// Show `prompt` if the source is interactive, then wait for one line.
    async fn read_line(&mut self, prompt: &str) -> std::io::Result<ReadLine>;
}

/// Reads the terminal. Ctrl-C interrupts the pending read.
///
/// The interrupt listener lives as long as the reader, so a Ctrl-C pressed
/// while a command runs interrupts the next read.
pub struct StdinReader {
    lines: Lines<BufReader<Stdin>>,
    interrupts: Interrupts,
}

impl StdinReader {
    /// Must be called from within a Tokio runtime.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            interrupts: Interrupts::listen()?,
        })
    }
}

#[async_trait]
impl LineReader for StdinReader {
    async fn read_line(&mut self, prompt: &str) -> std::io::Result<ReadLine> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        tokio::select! {
            biased;
            _ = self.interrupts.recv() => {
                writeln!(stdout)?;
                Ok(ReadLine::Interrupted)
            }
            line = self.lines.next_line() => match line? {
                Some(line) => Ok(ReadLine::Line(line)),
                None => {
                    writeln!(stdout)?;
                    Ok(ReadLine::Eof)
                }
            },
        }
    }
}

#[cfg(unix)]
struct Interrupts(tokio::signal::unix::Signal);

#[cfg(unix)]
impl Interrupts {
    fn listen() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self(signal(SignalKind::interrupt())?))
    }
}

#[cfg(windows)]
struct Interrupts(tokio::signal::windows::CtrlC);

#[cfg(windows)]
impl Interrupts {
    fn listen() -> std::io::Result<Self> {
        Ok(Self(tokio::signal::windows::ctrl_c()?))
    }
}

impl Interrupts {
    /// Wait for the next Ctrl-C, or return at once if one is already pending.
    async fn recv(&mut self) {
        if self.0.recv().await.is_none() {
            // listener gone: never report an interrupt again
            std::future::pending::<()>().await;
        }
    }
}

/// Replays prepared lines, then reports end of input.
#[derive(Debug, Clone, Default)]
pub struct ScriptReader {
    lines: VecDeque<String>,
    echo: bool,
}

impl ScriptReader {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            echo: false,
        }
    }

    /// Parse a script: one command per line, blank lines and `#` comments skipped.
    pub fn from_script(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Print each line after its prompt, as if it had been typed.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl LineReader for ScriptReader {
    async fn read_line(&mut self, prompt: &str) -> std::io::Result<ReadLine> {
        match self.lines.pop_front() {
            Some(line) => {
                if self.echo {
                    println!("{prompt}{line}");
                }
                Ok(ReadLine::Line(line))
            }
            None => Ok(ReadLine::Eof),
        }
    }
}
