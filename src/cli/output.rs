//! CLI output formatting

use crate::{
    core::{ExecutionStatus, StepState},
    execution::ExecutionEvent,
};
use console::{Emoji, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ARROW: Emoji<'_, '_> = Emoji("▸ ", "> ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Create a spinner for a running step
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Completed { .. } => style("COMPLETED").green().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format an execution event as a single line (or `None` for silent events)
pub fn format_execution_event(event: &ExecutionEvent) -> Option<String> {
    match event {
        ExecutionEvent::RunStarted { run_id } => Some(format!(
            "{}Starting run {}",
            ROCKET,
            style(&run_id.to_string()[..8]).dim()
        )),
        ExecutionEvent::StepStarted { title, depth, group } => {
            if *group {
                Some(format!("{}{}{}", indent(*depth), ARROW, style(title).bold()))
            } else {
                None
            }
        }
        ExecutionEvent::StepOutput { line, .. } => Some(style(line).dim().to_string()),
        ExecutionEvent::StepCompleted { title, depth, .. } => Some(format!(
            "{}{}{}",
            indent(*depth),
            CHECK,
            style(title).green()
        )),
        ExecutionEvent::StepSkipped {
            title,
            depth,
            reason,
        } => Some(match reason {
            Some(reason) => format!(
                "{}{}{} {}",
                indent(*depth),
                SKIP,
                style(title).dim(),
                style(format!("[{}]", reason)).yellow()
            ),
            None => format!("{}{}{} {}", indent(*depth), SKIP, style(title).dim(), style("[skipped]").dim()),
        }),
        ExecutionEvent::StepFailed {
            title,
            depth,
            error,
        } => Some(format!(
            "{}{}{}: {}",
            indent(*depth),
            CROSS,
            style(title).red(),
            style(error).dim()
        )),
        ExecutionEvent::RunFinished { status, .. } => {
            Some(format!("{}Run {}", INFO, format_status(*status)))
        }
    }
}

/// Where human-readable run output goes
///
/// Stdout is kept free for the report when it is printed as JSON.
pub fn report_term(json: bool) -> Term {
    if json {
        Term::stderr()
    } else {
        Term::stdout()
    }
}

/// Prints events to the terminal, with a spinner while a task step runs
///
/// Output lines are printed above the spinner so they appear in the order
/// the tool emitted them.
pub struct ConsoleOutput {
    term: Term,
    spinner: Mutex<Option<ProgressBar>>,
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::with_term(Term::stdout())
    }
}

impl ConsoleOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(term: Term) -> Self {
        Self {
            term,
            spinner: Mutex::new(None),
        }
    }

    pub fn handle(&self, event: &ExecutionEvent) {
        let mut spinner = self
            .spinner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match event {
            ExecutionEvent::StepStarted {
                title,
                depth,
                group: false,
            } => {
                *spinner = Some(create_spinner(format!("{}{}", indent(*depth), title)));
                return;
            }
            ExecutionEvent::StepCompleted { .. }
            | ExecutionEvent::StepSkipped { .. }
            | ExecutionEvent::StepFailed { .. } => {
                if let Some(active) = spinner.take() {
                    active.finish_and_clear();
                }
            }
            _ => {}
        }

        if let Some(line) = format_execution_event(event) {
            match spinner.as_ref() {
                Some(active) => active.println(line),
                None => {
                    let _ = self.term.write_line(&line);
                }
            }
        }
    }
}
