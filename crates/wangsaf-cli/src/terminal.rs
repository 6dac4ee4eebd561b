//! Line-based terminal frontend.
//!
//! Implements the [`Frontend`] trait over any buffered reader and writer:
//! each input line is submitted whole, and each render prints what changed
//! since the previous one (new transcript lines, status and roster changes).

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use wangsaf_app::{App, AppEvent, Frontend};

use crate::CliError;

/// What the previous render printed.
#[derive(Debug, Default)]
struct Printed {
    lines: usize,
    caption: Option<String>,
    users: Vec<String>,
}

/// Frontend reading commands line by line and writing the chat as text.
pub struct LineFrontend<R, W> {
    input: Lines<R>,
    output: W,
    printed: Printed,
}

impl<R, W> LineFrontend<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Create a frontend over `input` and `output`.
    pub fn new(input: R, output: W) -> Self {
        Self { input: input.lines(), output, printed: Printed::default() }
    }

    /// Get a reference to the output.
    pub fn output(&self) -> &W {
        &self.output
    }
}

impl<R, W> Frontend for LineFrontend<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    type Error = CliError;

    async fn next_input(&mut self) -> Result<Option<AppEvent>, CliError> {
        // Cancel safe: a partial line stays buffered in `Lines`.
        let line = self.input.next_line().await?;
        Ok(line.map(|line| AppEvent::Submit(line.trim_end_matches('\r').to_owned())))
    }

    fn render(&mut self, app: &App) -> Result<(), CliError> {
        let caption = app.caption();
        if self.printed.caption.as_deref() != Some(caption.as_str()) {
            writeln!(self.output, "-- {caption} --")?;
            self.printed.caption = Some(caption);
        }

        for line in app.transcript().iter().skip(self.printed.lines) {
            writeln!(self.output, "{line}")?;
        }
        self.printed.lines = app.transcript().len();

        if app.users() != self.printed.users.as_slice() {
            if !app.users().is_empty() {
                let users = app.users().join(", ");
                writeln!(self.output, "-- {} ({users}) --", app.users_caption())?;
            }
            self.printed.users = app.users().to_vec();
        }

        self.output.flush()?;
        Ok(())
    }
}
