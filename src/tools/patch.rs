//! Patch engine that delegates to a configured command

use crate::core::{config::ToolsConfig, PatchOptions};
use crate::tools::{
    process::{failed_stream, stream_command},
    LineStream, PatchEngine, ToolError,
};
use std::path::Path;
use tokio::process::Command;

pub const ENV_DECODE_DIR: &str = "APK_REPACK_DECODE_DIR";
pub const ENV_DEBUGGABLE: &str = "APK_REPACK_DEBUGGABLE";
pub const ENV_CERTIFICATE: &str = "APK_REPACK_CERTIFICATE";

/// Runs `patch_command` with the decode directory appended as last argument
///
/// The patch options are passed through the environment:
/// `APK_REPACK_DECODE_DIR`, `APK_REPACK_DEBUGGABLE` (`true`/`false`) and,
/// when a certificate is given, `APK_REPACK_CERTIFICATE`.
#[derive(Debug, Clone)]
pub struct CommandPatchEngine {
    argv: Vec<String>,
    timeout_secs: u64,
}

impl CommandPatchEngine {
    pub fn new(argv: Vec<String>, timeout_secs: u64) -> Self {
        Self { argv, timeout_secs }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(config.patch_command.clone(), config.timeout_secs)
    }
}

impl PatchEngine for CommandPatchEngine {
    fn apply(&self, decode_dir: &Path, options: &PatchOptions) -> LineStream {
        let Some((program, args)) = self.argv.split_first() else {
            return failed_stream(ToolError::NotConfigured("patch command"));
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .arg(decode_dir)
            .env(ENV_DECODE_DIR, decode_dir)
            .env(ENV_DEBUGGABLE, options.debuggable.to_string());
        if let Some(cert) = &options.certificate_path {
            command.env(ENV_CERTIFICATE, cert);
        }

        stream_command(program.as_str(), command, self.timeout_secs)
    }
}
