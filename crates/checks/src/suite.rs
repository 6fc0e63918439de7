//! Suite configuration file

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CheckError, Result};

/// Where the test documents live and how to title the report.
///
/// Read from YAML, TOML or JSON depending on the file extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_directory: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_title: Option<String>,
}

impl SuiteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let mut config: SuiteConfig = match extension.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(CheckError::Config(format!(
                    "{}: unsupported configuration format",
                    path.display()
                )))
            }
        };

        // Relative test directories are relative to the configuration file.
        if let (Some(directory), Some(base)) = (&config.test_directory, path.parent()) {
            if directory.is_relative() {
                config.test_directory = Some(base.join(directory));
            }
        }
        debug!("Loaded suite configuration {:?}", config);
        Ok(config)
    }
}
