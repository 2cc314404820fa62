//! Pipeline execution engine

pub mod engine;
pub mod events;
pub mod observe;

pub use engine::ExecutionEngine;
pub use events::{EventBus, EventHandler, ExecutionEvent};
pub use observe::{forward_lines, observe, Reporter};
