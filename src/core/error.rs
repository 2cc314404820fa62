//! Step and pipeline failures

use crate::tools::ToolError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Encoding strategy offered by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStrategy {
    /// Faster resource compiler, tried first
    Aapt2,
    /// Legacy resource compiler, used as fallback
    Aapt,
}

impl EncodeStrategy {
    pub fn uses_aapt2(self) -> bool {
        matches!(self, EncodeStrategy::Aapt2)
    }
}

impl fmt::Display for EncodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeStrategy::Aapt2 => f.write_str("AAPT2"),
            EncodeStrategy::Aapt => f.write_str("AAPT"),
        }
    }
}

/// Fatal failure of a step body
#[derive(Debug, Error)]
pub enum StepError {
    #[error("prerequisites not met")]
    Prerequisite(#[source] ToolError),

    #[error("failed to apply patches")]
    Patch(#[source] ToolError),

    #[error("encoding using {strategy} failed{}", earlier_failure(.primary_failure))]
    Encode {
        strategy: EncodeStrategy,
        #[source]
        source: ToolError,
        /// Failure of the strategy tried before this one, if any
        primary_failure: Option<String>,
    },

    #[error("signing failed")]
    Sign(#[source] ToolError),

    #[error("failed to copy {} to {}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read operator input")]
    Input(#[source] ToolError),

    #[error("interrupted by operator")]
    Interrupted,
}

fn earlier_failure(primary: &Option<String>) -> String {
    match primary {
        Some(reason) => format!(" (AAPT2 had already failed: {})", reason),
        None => String::new(),
    }
}

/// Failure that stopped a run, tagged with the title of the failing step
#[derive(Debug, Error)]
#[error("step '{step}' failed")]
pub struct PipelineError {
    pub step: String,
    #[source]
    pub source: StepError,
}

impl PipelineError {
    pub fn new(step: impl Into<String>, source: StepError) -> Self {
        Self {
            step: step.into(),
            source,
        }
    }
}

/// Render an error and its sources as `outer: inner: root`
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
