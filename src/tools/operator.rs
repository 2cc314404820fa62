//! Operator input for the interactive pause

use crate::tools::{OperatorInput, ToolError};
use async_trait::async_trait;
use console::Term;
use std::io::{self, BufRead, IsTerminal};
use tracing::debug;

/// Waits for a single key press on the controlling terminal
///
/// Interactivity is decided by stdin, so redirecting stderr does not skip
/// the pause. `console` switches the terminal to raw mode only for the
/// duration of `read_key` and restores it before returning, including when
/// Ctrl-C is read as a key. The cursor is hidden while waiting and shown
/// again by [`CursorGuard`] on every exit path. When stdin is not a terminal
/// the wait blocks until a full line arrives on it.
#[derive(Debug, Clone, Default)]
pub struct TerminalInput;

impl TerminalInput {
    pub fn new() -> Self {
        Self
    }
}

/// Shows the cursor again when dropped
struct CursorGuard<'a> {
    term: &'a Term,
}

impl<'a> CursorGuard<'a> {
    fn hide(term: &'a Term) -> Self {
        let _ = term.hide_cursor();
        Self { term }
    }
}

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        let _ = self.term.show_cursor();
    }
}

/// Block until one line can be read from `reader`
///
/// End of input before any line counts as an error, since nobody is left to
/// continue the run.
fn wait_for_line<R: BufRead>(mut reader: R) -> io::Result<()> {
    let mut buf = String::new();
    match reader.read_line(&mut buf)? {
        0 => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed while waiting",
        )),
        _ => Ok(()),
    }
}

fn read_one_key() -> io::Result<()> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        debug!("stdin is not a terminal, waiting for a line");
        return wait_for_line(stdin.lock());
    }

    let term = Term::stderr();
    let _guard = CursorGuard::hide(&term);
    term.read_key().map(|_| ())
}

fn input_error(e: io::Error) -> ToolError {
    match e.kind() {
        io::ErrorKind::Interrupted => ToolError::Interrupted,
        _ => ToolError::Io(e),
    }
}

#[async_trait]
impl OperatorInput for TerminalInput {
    async fn wait_for_key(&self) -> Result<(), ToolError> {
        tokio::task::spawn_blocking(read_one_key)
            .await
            .map_err(|e| ToolError::Failed(format!("input task failed: {}", e)))?
            .map_err(input_error)
    }
}
