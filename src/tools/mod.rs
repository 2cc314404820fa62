//! External collaborators driven by the pipeline

pub mod apktool;
pub mod error;
pub mod operator;
pub mod patch;
pub mod prerequisites;
pub mod process;
pub mod signer;

use crate::core::{config::ToolsConfig, PatchOptions, PipelineOptions};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use apktool::Apktool;
pub use error::ToolError;
pub use operator::TerminalInput;
pub use patch::CommandPatchEngine;
pub use prerequisites::ToolPrerequisites;
pub use signer::UberApkSigner;

/// Progress lines of a running operation, ending with `Err` if it failed
pub type LineStream = BoxStream<'static, Result<String, ToolError>>;

/// Validates the environment before anything is modified
#[async_trait]
pub trait PrerequisiteChecker: Send + Sync {
    async fn check(&self, options: &PipelineOptions) -> Result<(), ToolError>;
}

/// Mutates a decode directory in place
pub trait PatchEngine: Send + Sync {
    fn apply(&self, decode_dir: &Path, options: &PatchOptions) -> LineStream;
}

/// Packages a decode directory into an archive
pub trait Encoder: Send + Sync {
    /// `use_aapt2` selects the primary strategy; `false` is the legacy one
    fn encode(&self, decode_dir: &Path, output: &Path, use_aapt2: bool) -> LineStream;
}

/// Options for [`Signer::sign`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignOptions {
    pub zipalign: bool,
}

/// Signs archives in place
pub trait Signer: Send + Sync {
    fn sign(&self, archives: &[PathBuf], options: SignOptions) -> LineStream;
}

/// Source of a single "continue" event from the operator
#[async_trait]
pub trait OperatorInput: Send + Sync {
    async fn wait_for_key(&self) -> Result<(), ToolError>;
}

/// Handles to every collaborator a run uses
#[derive(Clone)]
pub struct Toolbox {
    pub prerequisites: Arc<dyn PrerequisiteChecker>,
    pub patcher: Arc<dyn PatchEngine>,
    pub encoder: Arc<dyn Encoder>,
    pub signer: Arc<dyn Signer>,
    pub input: Arc<dyn OperatorInput>,
}

impl Toolbox {
    /// Real tools as described by the configuration
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            prerequisites: Arc::new(ToolPrerequisites::from_config(config)),
            patcher: Arc::new(CommandPatchEngine::from_config(config)),
            encoder: Arc::new(Apktool::from_config(config)),
            signer: Arc::new(UberApkSigner::from_config(config)),
            input: Arc::new(TerminalInput::new()),
        }
    }
}

impl fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolbox").finish_non_exhaustive()
    }
}
