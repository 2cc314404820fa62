//! uber-apk-signer

use crate::core::config::ToolsConfig;
use crate::tools::{process::stream_command, LineStream, SignOptions, Signer};
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;

/// Signer backed by `java -jar uber-apk-signer.jar`
///
/// Signs with the tool's debug key and overwrites the input archives.
#[derive(Debug, Clone)]
pub struct UberApkSigner {
    java: PathBuf,
    jar: PathBuf,
    timeout_secs: u64,
}

impl UberApkSigner {
    pub fn new(java: PathBuf, jar: PathBuf, timeout_secs: u64) -> Self {
        Self {
            java,
            jar,
            timeout_secs,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(
            config.java.clone(),
            config.uber_apk_signer.clone(),
            config.timeout_secs,
        )
    }

    pub fn sign_args(&self, archives: &[PathBuf], options: SignOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-jar".into(), self.jar.clone().into(), "--apks".into()];
        args.extend(archives.iter().map(|p| p.clone().into_os_string()));
        args.push("--allowResign".into());
        args.push("--overwrite".into());
        if !options.zipalign {
            args.push("--skipZipAlign".into());
        }
        args
    }
}

impl Signer for UberApkSigner {
    fn sign(&self, archives: &[PathBuf], options: SignOptions) -> LineStream {
        let mut command = Command::new(&self.java);
        command.args(self.sign_args(archives, options));
        stream_command("uber-apk-signer", command, self.timeout_secs)
    }
}
