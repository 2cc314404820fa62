//! Subprocess runner that streams output line by line

use crate::tools::{LineStream, ToolError};
use futures::StreamExt;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

const LINE_BUFFER: usize = 64;

type LineSender = mpsc::Sender<Result<String, ToolError>>;

enum Waited {
    Exited(io::Result<ExitStatus>),
    TimedOut,
    /// Nobody reads the stream anymore
    Abandoned,
}

/// Run `command` in the background and stream its stdout and stderr lines
///
/// The stream ends after the last line on success. On failure (spawn error,
/// non-zero exit, timeout) the last item is the error, after every line the
/// process printed. Dropping the stream kills the process.
///
/// `timeout_secs` bounds the whole run, including reading output that is
/// still open after the process exited (a daemon it left behind may hold
/// the pipes).
pub fn stream_command(tool: impl Into<String>, command: Command, timeout_secs: u64) -> LineStream {
    let tool = tool.into();
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    tokio::spawn(async move {
        if let Err(e) = run_command(&tool, command, timeout_secs, tx.clone()).await {
            let _ = tx.send(Err(e)).await;
        }
    });

    ReceiverStream::new(rx).boxed()
}

/// A stream that fails immediately
pub fn failed_stream(error: ToolError) -> LineStream {
    futures::stream::once(async move { Err(error) }).boxed()
}

async fn run_command(
    tool: &str,
    mut command: Command,
    timeout_secs: u64,
    tx: LineSender,
) -> Result<(), ToolError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Spawning {}: {:?}", tool, command.as_std());

    let mut child = command.spawn().map_err(|source| ToolError::Spawn {
        tool: tool.to_string(),
        source,
    })?;

    let mut readers: Vec<_> = [
        child.stdout.take().map(|out| tokio::spawn(forward_lines(out, tx.clone()))),
        child.stderr.take().map(|err| tokio::spawn(forward_lines(err, tx.clone()))),
    ]
    .into_iter()
    .flatten()
    .collect();

    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    let waited = tokio::select! {
        result = timeout_at(deadline, child.wait()) => match result {
            Ok(status) => Waited::Exited(status),
            Err(_) => Waited::TimedOut,
        },
        _ = tx.closed() => Waited::Abandoned,
    };

    let status = match waited {
        Waited::Exited(status) => status?,
        Waited::TimedOut => {
            warn!("{} timed out after {}s, killing it", tool, timeout_secs);
            let _ = child.kill().await;
            readers.iter().for_each(|reader| reader.abort());
            return Err(ToolError::Timeout {
                tool: tool.to_string(),
                secs: timeout_secs,
            });
        }
        Waited::Abandoned => {
            debug!("Output of {} is no longer read, killing it", tool);
            let _ = child.kill().await;
            readers.iter().for_each(|reader| reader.abort());
            return Ok(());
        }
    };

    // Every line must reach the stream before the exit status does
    let drained = timeout_at(deadline, futures::future::join_all(readers.iter_mut())).await;
    if drained.is_err() {
        warn!("{} exited but its output is still open, not waiting for it", tool);
        readers.iter().for_each(|reader| reader.abort());
    }

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        warn!("{} exited with code {}", tool, code);
        return Err(ToolError::Exit {
            tool: tool.to_string(),
            code,
        });
    }

    debug!("{} finished", tool);
    Ok(())
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, tx: LineSender) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(Ok(line)).await.is_err() {
            break;
        }
    }
}
