//! Environment checks run before any work

use crate::core::{config::ToolsConfig, PipelineOptions};
use crate::tools::{PrerequisiteChecker, ToolError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Checks that java, both jars and the run's input files are present
#[derive(Debug, Clone)]
pub struct ToolPrerequisites {
    java: PathBuf,
    apktool: PathBuf,
    uber_apk_signer: PathBuf,
    patch_program: Option<String>,
}

impl ToolPrerequisites {
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            java: config.java.clone(),
            apktool: config.apktool.clone(),
            uber_apk_signer: config.uber_apk_signer.clone(),
            patch_program: config.patch_command.first().cloned(),
        }
    }
}

fn require_executable(program: impl AsRef<std::ffi::OsStr>) -> Result<PathBuf, ToolError> {
    let program = program.as_ref();
    which::which(program).map_err(|_| ToolError::NotFound(program.to_string_lossy().into_owned()))
}

async fn require_file(path: &Path, what: &str) -> Result<(), ToolError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(ToolError::NotFound(format!("{} at {}", what, path.display()))),
    }
}

#[async_trait]
impl PrerequisiteChecker for ToolPrerequisites {
    async fn check(&self, options: &PipelineOptions) -> Result<(), ToolError> {
        let java = require_executable(&self.java)?;
        debug!("Using java at {}", java.display());

        require_file(&self.apktool, "apktool jar").await?;
        require_file(&self.uber_apk_signer, "uber-apk-signer jar").await?;

        match tokio::fs::metadata(&options.input_path).await {
            Ok(meta) if meta.is_dir() => {}
            _ => {
                return Err(ToolError::NotFound(format!(
                    "decode directory {}",
                    options.input_path.display()
                )))
            }
        }

        if !options.skip_patches {
            let program = self
                .patch_program
                .as_ref()
                .ok_or(ToolError::NotConfigured("patch command"))?;
            require_executable(program)?;

            if let Some(cert) = &options.patch.certificate_path {
                require_file(cert, "certificate").await?;
            }
        }

        tokio::fs::create_dir_all(&options.tmp_dir).await?;
        Ok(())
    }
}
