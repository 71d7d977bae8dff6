use anyhow::{Context, Result};
use quanta_cwl_core::TranslatorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub translator: TranslatorConfig,
}

impl CliConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            let config: Self =
                toml::from_str(&content).context("Failed to parse configuration file")?;
            config
                .translator
                .validate()
                .context("Invalid translator configuration")?;
            Ok(config)
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }
}
