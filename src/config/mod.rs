//! Configuration module for VisionForge-RS
//!
//! Application-level preferences: the default target language and the
//! default pipeline class name. Stored as TOML next to wherever the caller
//! points; the CLI uses `visionforge.toml` in the working directory when
//! present.

use crate::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Target language when none is given on the command line.
    pub default_language: String,
    /// Class name for the generated pipeline.
    pub pipeline_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_language: "java".to_string(),
            pipeline_name: "GeneratedPipeline".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        toml::from_str(&data).map_err(|e| ForgeError::Config(e.to_string()))
    }

    /// Load from `path`, or fall back to defaults when the file is absent
    /// or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("using default config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = toml::to_string_pretty(self).map_err(|e| ForgeError::Config(e.to_string()))?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_language, "java");
        assert_eq!(config.pipeline_name, "GeneratedPipeline");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig {
            default_language: "python".to_string(),
            pipeline_name: "MyPipeline".to_string(),
        };
        let text = toml::to_string(&config).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let back: AppConfig = toml::from_str("default_language = \"python\"").unwrap();
        assert_eq!(back.default_language, "python");
        assert_eq!(back.pipeline_name, "GeneratedPipeline");
    }
}
