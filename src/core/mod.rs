//! Core domain models for the repack pipeline
//!
//! This module defines the step graph, run-scoped state, options, errors
//! and the concrete pipeline built from them.

pub mod config;
pub mod context;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod state;
pub mod step;

pub use context::*;
pub use error::*;
pub use options::*;
pub use pipeline::*;
pub use state::*;
pub use step::*;
