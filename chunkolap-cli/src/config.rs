//! Configuration handling for the chunkolap CLI
//!
//! Supports loading configuration from chunkolap.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use chunkolap_core::{LocalAlignerParams, OverlapParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "chunkolap.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub overlap: OverlapParams,
    #[serde(default)]
    pub aligner: LocalAlignerParams,
    #[serde(default)]
    pub discover: DiscoverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverConfig {
    /// Recompute windows proposed by the upstream overlap builder
    #[serde(default)]
    pub force_recompute: bool,

    /// Add discovered overlaps to the graph as edges
    #[serde(default = "default_true")]
    pub insert_edges: bool,
}

fn default_true() -> bool { true }

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            force_recompute: false,
            insert_edges: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };
        config
            .overlap
            .validate()
            .context("Invalid [overlap] configuration")?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = Self::to_toml(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;
        Ok(())
    }

    fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        Self::default().to_toml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkolap_core::AlignMode;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.overlap.sections, 5);
        assert_eq!(config.aligner.mismatch_score, -3);
        assert!(config.discover.insert_edges);
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.overlap.error_rate = 0.06;
        config.overlap.align_mode = AlignMode::LocalOverlap;
        let temp_file = NamedTempFile::new()?;
        config.save_to_file(temp_file.path())?;

        let loaded_config = Config::load_from_file(temp_file.path())?;
        assert_eq!(loaded_config.overlap, config.overlap);
        assert_eq!(loaded_config.aligner, config.aligner);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let config: Config = toml::from_str("[overlap]\nmin_length = 50\n")?;
        assert_eq!(config.overlap.min_length, 50);
        assert_eq!(config.overlap.window_slop, 10);
        assert_eq!(config.aligner, LocalAlignerParams::default());
        Ok(())
    }

    #[test]
    fn test_out_of_range_error_rate_rejected() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        std::fs::write(temp_file.path(), "[overlap]\nerror_rate = 0.5\n")?;
        assert!(Config::load(Some(temp_file.path())).is_err());

        // a zero rate would be written to caches the loader refuses
        std::fs::write(temp_file.path(), "[overlap]\nerror_rate = 0.0\n")?;
        assert!(Config::load(Some(temp_file.path())).is_err());
        Ok(())
    }

    #[test]
    fn test_example_toml_generation() -> Result<()> {
        let example = Config::example_toml()?;
        assert!(example.contains("[overlap]"));
        assert!(example.contains("[aligner]"));
        assert!(example.contains("[discover]"));
        Ok(())
    }
}
