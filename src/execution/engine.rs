//! Main execution engine - runs a step graph in declared order

use crate::{
    core::{
        error_chain, PipelineError, RunReport, Step, StepKind, StepOutcome, StepRecord, StepState,
    },
    execution::{events::EventBus, ExecutionEvent, Reporter},
};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, error, info, warn};

/// Sequential step graph executor
///
/// At most one step body runs at a time. The first failure that a body does
/// not handle itself stops the whole run.
#[derive(Clone, Default)]
pub struct ExecutionEngine {
    events: EventBus,
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler);
    }

    /// Run `steps` and record every reached step in `report`
    pub async fn execute(&self, steps: &[Step], report: &mut RunReport) -> Result<(), PipelineError> {
        let run_id = report.run_id;
        info!("Starting pipeline run {}", run_id);
        report.start();
        self.events.emit(ExecutionEvent::RunStarted { run_id });

        let result = self.run_steps(steps, 0, report).await;

        match &result {
            Ok(()) => {
                report.complete();
                info!("Pipeline run {} completed", run_id);
            }
            Err(e) => {
                report.fail();
                error!("Pipeline run {} failed: {}", run_id, error_chain(e));
            }
        }
        self.events.emit(ExecutionEvent::RunFinished {
            run_id,
            status: report.status,
        });

        result
    }

    fn run_steps<'a>(
        &'a self,
        steps: &'a [Step],
        depth: usize,
        report: &'a mut RunReport,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        async move {
            for step in steps {
                self.run_step(step, depth, report).await?;
            }
            Ok(())
        }
        .boxed()
    }

    async fn run_step(
        &self,
        step: &Step,
        depth: usize,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        if !step.is_enabled() {
            debug!("Step '{}' is disabled, omitting it", step.title);
            return Ok(());
        }

        let group = step.is_group();
        let index = report.push(StepRecord::new(&step.title, depth, group));

        if step.should_skip() {
            let reason = step.skip_reason().map(str::to_string);
            info!("Skipping step '{}'", step.title);
            self.mark_skipped(report, index, depth, reason);
            return Ok(());
        }

        let started_at = Utc::now();
        report.records[index].state = StepState::Running { started_at };
        info!("Running step '{}'", step.title);
        self.events.emit(ExecutionEvent::StepStarted {
            title: step.title.clone(),
            depth,
            group,
        });

        let result = match &step.kind {
            StepKind::Task(task) => {
                let reporter = Reporter::new(&step.title, self.events.clone());
                task(reporter)
                    .await
                    .map_err(|source| PipelineError::new(&step.title, source))
            }
            StepKind::Group(children) => self
                .run_steps(children, depth + 1, report)
                .await
                .map(|()| StepOutcome::Completed),
        };

        match result {
            Ok(StepOutcome::Completed) => {
                report.records[index].state = StepState::Completed {
                    started_at,
                    completed_at: Utc::now(),
                };
                info!("Step '{}' completed", step.title);
                self.events.emit(ExecutionEvent::StepCompleted {
                    title: step.title.clone(),
                    depth,
                    group,
                });
                Ok(())
            }
            Ok(StepOutcome::Skipped { reason }) => {
                info!("Step '{}' skipped itself: {}", step.title, reason);
                self.mark_skipped(report, index, depth, Some(reason));
                Ok(())
            }
            Err(err) => {
                let message = error_chain(&err.source);
                warn!("Step '{}' failed: {}", step.title, message);
                report.records[index].state = StepState::Failed {
                    error: message.clone(),
                    started_at,
                    failed_at: Utc::now(),
                };
                self.events.emit(ExecutionEvent::StepFailed {
                    title: step.title.clone(),
                    depth,
                    error: message,
                });
                Err(err)
            }
        }
    }

    fn mark_skipped(
        &self,
        report: &mut RunReport,
        index: usize,
        depth: usize,
        reason: Option<String>,
    ) {
        let record = &mut report.records[index];
        record.state = StepState::Skipped {
            reason: reason.clone(),
        };
        self.events.emit(ExecutionEvent::StepSkipped {
            title: record.title.clone(),
            depth,
            reason,
        });
    }
}
