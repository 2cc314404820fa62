//! External tool configuration from YAML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up under the user's config directory
pub const CONFIG_FILE_NAME: &str = "tools.yaml";

/// Locations and limits of the external tools the pipeline drives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Java executable used to launch the jars
    #[serde(default = "default_java")]
    pub java: PathBuf,

    /// Path to the apktool jar
    #[serde(default = "default_apktool")]
    pub apktool: PathBuf,

    /// Path to the uber-apk-signer jar
    #[serde(default = "default_uber_apk_signer")]
    pub uber_apk_signer: PathBuf,

    /// Framework directory passed to apktool (`--frame-path`)
    #[serde(default)]
    pub framework_dir: Option<PathBuf>,

    /// Command run to patch the decode directory, as an argv list
    #[serde(default)]
    pub patch_command: Vec<String>,

    /// Upper bound for any single tool invocation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_java() -> PathBuf {
    PathBuf::from("java")
}

fn default_apktool() -> PathBuf {
    PathBuf::from("apktool.jar")
}

fn default_uber_apk_signer() -> PathBuf {
    PathBuf::from("uber-apk-signer.jar")
}

fn default_timeout_secs() -> u64 {
    1800
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            apktool: default_apktool(),
            uber_apk_signer: default_uber_apk_signer(),
            framework_dir: None,
            patch_command: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolsConfig {
    /// Load tool configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse tool configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ToolsConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, or from the default location if it exists
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/apk-repack/tools.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("apk-repack").join(CONFIG_FILE_NAME))
    }

    /// Validate the tool configuration
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }

        if self
            .patch_command
            .first()
            .is_some_and(|program| program.trim().is_empty())
        {
            anyhow::bail!("patch_command must start with a program name");
        }

        Ok(())
    }
}
