//! Execution events and their delivery

use crate::core::ExecutionStatus;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Events that can occur during a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
    },
    StepStarted {
        title: String,
        depth: usize,
        group: bool,
    },
    StepOutput {
        title: String,
        line: String,
    },
    StepCompleted {
        title: String,
        depth: usize,
        group: bool,
    },
    StepSkipped {
        title: String,
        depth: usize,
        reason: Option<String>,
    },
    StepFailed {
        title: String,
        depth: usize,
        error: String,
    },
    RunFinished {
        run_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// Fan-out of events to registered handlers, in registration order
///
/// Delivery is synchronous so handlers see events in emission order.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<RwLock<Vec<EventHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::new(handler));
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for handler in handlers.iter() {
            handler(&event);
        }
    }
}
