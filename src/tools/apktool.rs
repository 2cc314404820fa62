//! apktool encoder

use crate::core::config::ToolsConfig;
use crate::tools::{process::stream_command, Encoder, LineStream};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Encoder backed by `java -jar apktool.jar build`
#[derive(Debug, Clone)]
pub struct Apktool {
    java: PathBuf,
    jar: PathBuf,
    framework_dir: Option<PathBuf>,
    timeout_secs: u64,
}

impl Apktool {
    pub fn new(java: PathBuf, jar: PathBuf, timeout_secs: u64) -> Self {
        Self {
            java,
            jar,
            framework_dir: None,
            timeout_secs,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            framework_dir: config.framework_dir.clone(),
            ..Self::new(config.java.clone(), config.apktool.clone(), config.timeout_secs)
        }
    }

    /// Arguments passed to java for one build
    pub fn build_args(&self, decode_dir: &Path, output: &Path, use_aapt2: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-jar".into(),
            self.jar.clone().into(),
            "build".into(),
            decode_dir.into(),
            "--output".into(),
            output.into(),
        ];
        if let Some(dir) = &self.framework_dir {
            args.push("--frame-path".into());
            args.push(dir.into());
        }
        if use_aapt2 {
            args.push("--use-aapt2".into());
        }
        args
    }
}

impl Encoder for Apktool {
    fn encode(&self, decode_dir: &Path, output: &Path, use_aapt2: bool) -> LineStream {
        let mut command = Command::new(&self.java);
        command.args(self.build_args(decode_dir, output, use_aapt2));
        stream_command("apktool", command, self.timeout_secs)
    }
}
