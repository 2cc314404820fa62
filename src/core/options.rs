//! Options consumed by one pipeline run

use crate::tools::Toolbox;
use std::path::PathBuf;

/// Options forwarded to the patch engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Mark the application as debuggable
    pub debuggable: bool,

    /// Extra certificate to trust
    pub certificate_path: Option<PathBuf>,
}

/// Everything a run needs, fixed for its whole duration
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Decode directory, patched in place
    pub input_path: PathBuf,

    /// Scratch directory for the intermediate archive
    pub tmp_dir: PathBuf,

    /// Where the signed archive ends up
    pub output_path: PathBuf,

    /// Leave the decode directory untouched
    pub skip_patches: bool,

    /// Pause for the operator before encoding
    pub wait: bool,

    pub patch: PatchOptions,

    /// Collaborators doing the actual work
    pub tools: Toolbox,
}
