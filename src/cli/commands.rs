//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Rebuild, sign and deliver a decoded APK
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Decode directory produced by apktool
    pub input: PathBuf,

    /// Where to write the signed APK
    #[arg(short, long)]
    pub output: PathBuf,

    /// Scratch directory (a temporary one is created and removed if omitted)
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,

    /// Don't run the patch command
    #[arg(long)]
    pub skip_patches: bool,

    /// Pause before encoding so the decode directory can be edited by hand
    #[arg(long)]
    pub wait: bool,

    /// Ask the patch command to make the app debuggable
    #[arg(long)]
    pub debuggable: bool,

    /// Extra certificate for the patch command to trust
    #[arg(long)]
    pub certificate: Option<PathBuf>,

    /// Tool configuration file (YAML)
    #[arg(long)]
    pub tools: Option<PathBuf>,

    /// Print the run report as JSON when done
    #[arg(long)]
    pub json: bool,
}

/// Validate and print the tool configuration
#[derive(Debug, Args, Clone)]
pub struct ConfigCommand {
    /// Tool configuration file (YAML)
    #[arg(long)]
    pub tools: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
