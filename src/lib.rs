//! apk-repack - rebuild and re-sign a patched, decoded APK

pub mod cli;
pub mod core;
pub mod execution;
pub mod tools;

// Re-export commonly used types
pub use core::{
    PatchOptions, PipelineError, PipelineOptions, RepackPipeline, RunReport, RunState, Step,
    StepError, StepOutcome, StepState,
};
pub use execution::{ExecutionEngine, ExecutionEvent, Reporter};
pub use tools::{Encoder, OperatorInput, PatchEngine, PrerequisiteChecker, Signer, ToolError, Toolbox};
