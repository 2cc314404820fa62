//! Tool error types

use thiserror::Error;

/// Error types for external tool operations
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("failed to start {tool}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with code {code}")]
    Exit { tool: String, code: i32 },

    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },

    #[error("no {0} configured")]
    NotConfigured(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("interrupted")]
    Interrupted,

    #[error("{0}")]
    Failed(String),
}
