//! Bridges collaborator progress into step output
//!
//! A step body gets a [`Reporter`] bound to its title. Anything reported
//! through it becomes an [`ExecutionEvent::StepOutput`] for that step, in
//! the order it was reported.

use crate::execution::events::{EventBus, ExecutionEvent};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::sync::Arc;

/// Handle a step body uses to publish progress lines
#[derive(Clone)]
pub struct Reporter {
    title: Arc<str>,
    events: EventBus,
}

impl Reporter {
    pub fn new(title: &str, events: EventBus) -> Self {
        Self {
            title: Arc::from(title),
            events,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Publish one line of output
    pub fn report(&self, line: impl Into<String>) {
        self.events.emit(ExecutionEvent::StepOutput {
            title: self.title.to_string(),
            line: line.into(),
        });
    }
}

/// Run `operation` with a reporter for the current step
///
/// The operation's result is returned as is, so a failure propagates unless
/// the caller handles it.
pub async fn observe<F, Fut, T, E>(reporter: &Reporter, operation: F) -> Result<T, E>
where
    F: FnOnce(Reporter) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    operation(reporter.clone()).await
}

/// Forward every line of `lines` to `reporter` until the stream ends
///
/// Returns the number of lines forwarded, or the first error. Lines emitted
/// before the error have already been reported.
pub async fn forward_lines<S, E>(reporter: &Reporter, lines: S) -> Result<usize, E>
where
    S: Stream<Item = Result<String, E>>,
{
    futures::pin_mut!(lines);
    let mut count = 0;
    while let Some(item) = lines.next().await {
        reporter.report(item?);
        count += 1;
    }
    Ok(count)
}
