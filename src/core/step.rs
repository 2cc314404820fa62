//! Step domain model

use crate::core::error::StepError;
use crate::execution::Reporter;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Predicate evaluated by the engine right before a step is reached
pub type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Future returned by a task body
pub type TaskFuture = BoxFuture<'static, Result<StepOutcome, StepError>>;

/// Task body. Receives a reporter bound to the step's title.
pub type TaskFn = Arc<dyn Fn(Reporter) -> TaskFuture + Send + Sync>;

/// How a body that did not fail finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Body did its work
    Completed,
    /// Body decided at run time that it should count as skipped
    Skipped { reason: String },
}

/// Body of a step: a unit of work or a nested list of steps
pub enum StepKind {
    Task(TaskFn),
    Group(Vec<Step>),
}

/// A single step in a pipeline
pub struct Step {
    /// Display title
    pub title: String,

    /// When false the step is omitted entirely (neither run nor reported)
    enabled: Option<Predicate>,

    /// When true the step is reported as skipped and its body is not run
    skip: Option<Predicate>,

    /// Reason reported when `skip` fires
    skip_reason: Option<String>,

    /// The work itself
    pub kind: StepKind,
}

impl Step {
    /// Create a leaf step from an async body
    pub fn task<F, Fut>(title: impl Into<String>, body: F) -> Self
    where
        F: Fn(Reporter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StepOutcome, StepError>> + Send + 'static,
    {
        let task: TaskFn = Arc::new(move |reporter| body(reporter).boxed());
        Self::with_kind(title, StepKind::Task(task))
    }

    /// Create a step that runs a nested list of steps
    pub fn group(title: impl Into<String>, steps: Vec<Step>) -> Self {
        Self::with_kind(title, StepKind::Group(steps))
    }

    fn with_kind(title: impl Into<String>, kind: StepKind) -> Self {
        Self {
            title: title.into(),
            enabled: None,
            skip: None,
            skip_reason: None,
            kind,
        }
    }

    /// Only include the step when `predicate` holds
    pub fn enabled_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn() -> bool + Send + Sync + 'static,
    {
        self.enabled = Some(Arc::new(predicate));
        self
    }

    /// Skip the step when `predicate` holds
    pub fn skip_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn() -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(predicate));
        self
    }

    /// Reason to report when the skip predicate fires
    pub fn with_skip_reason(mut self, reason: impl Into<String>) -> Self {
        self.skip_reason = Some(reason.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.as_ref().map_or(true, |p| p())
    }

    pub fn should_skip(&self) -> bool {
        self.skip.as_ref().is_some_and(|p| p())
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, StepKind::Group(_))
    }

    /// Sub-steps of a group, empty for tasks
    pub fn children(&self) -> &[Step] {
        match &self.kind {
            StepKind::Group(steps) => steps,
            StepKind::Task(_) => &[],
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Step");
        s.field("title", &self.title)
            .field("enabled", &self.enabled.is_some())
            .field("skip", &self.skip.is_some())
            .field("skip_reason", &self.skip_reason);
        match &self.kind {
            StepKind::Task(_) => s.field("kind", &"task"),
            StepKind::Group(steps) => s.field("steps", steps),
        };
        s.finish()
    }
}
