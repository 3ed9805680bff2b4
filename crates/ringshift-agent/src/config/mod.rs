//! Configuration loading for ringshift.
//! Reads ringshift.toml from the current directory or path in RINGSHIFT_CONFIG env var.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use ringshift_common::analysis_config::AnalysisConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analysis sections live at the top level of the file
    #[serde(flatten)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Print the pair and amide results tables after the audit counts
    #[serde(default = "bool_true")]
    pub print_tables: bool,
    /// Also write the audit report and both tables as JSON here
    #[serde(default)]
    pub json_path: Option<PathBuf>,
}

fn bool_true() -> bool { true }

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            print_tables: bool_true(),
            json_path: None,
        }
    }
}


impl Config {
    pub fn path() -> String {
        std::env::var("RINGSHIFT_CONFIG").unwrap_or_else(|_| "ringshift.toml".to_string())
    }

    /// Load configuration from ringshift.toml.
    /// Checks RINGSHIFT_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_file(Path::new(&Self::path()))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.analysis.validate()?;
        Ok(config)
    }
}
