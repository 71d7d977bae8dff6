use crate::cwl::builder::{DEPENDENCIES_INPUT, INIT_OUTPUT, INIT_STEP, PIPELINE_INPUT};
use crate::error::{CwlError, Result};
use serde::{Deserialize, Serialize};

/// Highest zlib compression level
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Suffixes of names generated per quantum
const RESERVED_SUFFIXES: [&str; 3] = ["_quantum", "_output", "_job"];

/// Settings that control the generated workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_cwl_version")]
    pub cwl_version: String,

    /// Command run by the initialization step
    #[serde(default = "default_init_command")]
    pub init_command: String,

    /// Command run by every quantum step
    #[serde(default = "default_executor_command")]
    pub executor_command: String,

    /// Name of the workflow input carrying the execution context
    #[serde(default = "default_context_input")]
    pub context_input: String,

    /// zlib level (0-9) for node payloads
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

fn default_cwl_version() -> String {
    "v1.0".to_string()
}

fn default_init_command() -> String {
    "cwlInit".to_string()
}

fn default_executor_command() -> String {
    "cwlExecutor".to_string()
}

fn default_context_input() -> String {
    "butler".to_string()
}

fn default_compression_level() -> u32 {
    6
}

impl TranslatorConfig {
    /// Reject settings that would make generated names collide
    pub fn validate(&self) -> Result<()> {
        let context = self.context_input.as_str();

        if context.is_empty() {
            return Err(CwlError::Config("context_input must not be empty".to_string()));
        }

        let reserved = [PIPELINE_INPUT, DEPENDENCIES_INPUT, INIT_STEP, INIT_OUTPUT, "quantum"];
        if reserved.contains(&context) {
            return Err(CwlError::Config(format!(
                "context_input '{}' is a reserved name",
                context
            )));
        }

        if let Some(suffix) = RESERVED_SUFFIXES.iter().find(|s| context.ends_with(*s)) {
            return Err(CwlError::Config(format!(
                "context_input '{}' must not end with '{}'",
                context, suffix
            )));
        }

        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(CwlError::Config(format!(
                "compression_level {} is above {}",
                self.compression_level, MAX_COMPRESSION_LEVEL
            )));
        }

        Ok(())
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            cwl_version: default_cwl_version(),
            init_command: default_init_command(),
            executor_command: default_executor_command(),
            context_input: default_context_input(),
            compression_level: default_compression_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_context(name: &str) -> TranslatorConfig {
        TranslatorConfig {
            context_input: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TranslatorConfig::default().validate().is_ok());
        assert!(with_context("repo").validate().is_ok());
    }

    #[test]
    fn test_reserved_context_names_rejected() {
        for name in ["pipeline", "dependencies", "quantum", "init_job", "", "repo_quantum", "x_output", "x_job"] {
            let err = with_context(name).validate().unwrap_err();
            assert!(matches!(err, CwlError::Config(_)), "accepted {:?}", name);
        }
    }

    #[test]
    fn test_compression_level_above_max_rejected() {
        let config = TranslatorConfig {
            compression_level: 12,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("compression_level 12"));
    }
}
