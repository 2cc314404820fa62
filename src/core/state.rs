//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Pipeline has not started
    Pending,
    /// Pipeline is currently running
    Running,
    /// Pipeline completed successfully
    Completed,
    /// Pipeline failed
    Failed,
}

/// State of a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepState {
    /// Step has been recorded but not started
    Pending,
    /// Step is currently running
    Running {
        started_at: DateTime<Utc>,
    },
    /// Step completed successfully
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step was skipped, either by its predicate or by its own body
    Skipped {
        reason: Option<String>,
    },
    /// Step failed and stopped the run
    Failed {
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
}

impl StepState {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Completed { .. } | StepState::Failed { .. } | StepState::Skipped { .. }
        )
    }

    /// Short label used in traces: `pending`, `running`, `ok`, `skipped` or `failed`
    pub fn label(&self) -> &'static str {
        match self {
            StepState::Pending => "pending",
            StepState::Running { .. } => "running",
            StepState::Completed { .. } => "ok",
            StepState::Skipped { .. } => "skipped",
            StepState::Failed { .. } => "failed",
        }
    }

    /// Skip reason, if the step was skipped with one
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            StepState::Skipped { reason } => reason.as_deref(),
            _ => None,
        }
    }
}

/// One entry of the run trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step title as displayed
    pub title: String,

    /// Nesting depth (0 for top-level steps)
    pub depth: usize,

    /// Whether the step is a group of sub-steps
    pub group: bool,

    /// Final (or current) state
    pub state: StepState,
}

impl StepRecord {
    pub fn new(title: impl Into<String>, depth: usize, group: bool) -> Self {
        Self {
            title: title.into(),
            depth,
            group,
            state: StepState::Pending,
        }
    }
}

/// Trace of a single pipeline run
///
/// Records appear in the order steps were reached. Steps omitted by their
/// `enabled` predicate never appear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution completed/failed
    pub finished_at: Option<DateTime<Utc>>,

    /// Reached steps, in order
    pub records: Vec<StepRecord>,
}

impl RunReport {
    /// Create an empty report for the given run
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            status: ExecutionStatus::Pending,
            started_at: None,
            finished_at: None,
            records: Vec::new(),
        }
    }

    /// Mark run as started
    pub fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Mark run as completed
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    /// Mark run as failed
    pub fn fail(&mut self) {
        self.status = ExecutionStatus::Failed;
        self.finished_at = Some(Utc::now());
    }

    /// Append a record and return its index
    pub fn push(&mut self, record: StepRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Find the first record with the given title
    pub fn record(&self, title: &str) -> Option<&StepRecord> {
        self.records.iter().find(|r| r.title == title)
    }

    /// Leaf steps as `title:label` strings, groups left out
    pub fn trace(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.group)
            .map(|r| format!("{}:{}", r.title, r.state.label()))
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }
}
