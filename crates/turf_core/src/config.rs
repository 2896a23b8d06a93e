//! Runtime configuration
//!
//! Defaults match the reference behaviour; a YAML file named by
//! `TURF_CONFIG_PATH` overrides any subset of fields.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version stamped into every snapshot. Snapshots from any other version are discarded.
pub const APP_VERSION: &str = "8.0.0";

pub const CONFIG_PATH_ENV: &str = "TURF_CONFIG_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Delay between playback steps.
    pub step_interval_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { step_interval_ms: 2000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemistryConfig {
    /// Max slot distance (percentage units) for a rendered chemistry link.
    pub adjacency_distance: f64,
}

impl Default for ChemistryConfig {
    fn default() -> Self {
        Self { adjacency_distance: 30.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
    /// Persist the active snapshot after every state-changing dispatch.
    pub autosave: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("saves"), autosave: true }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurfConfig {
    pub animation: AnimationConfig,
    pub chemistry: ChemistryConfig,
    pub storage: StorageConfig,
}

impl TurfConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TurfConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_yaml_str(&content)
    }

    /// Load from the file named by `TURF_CONFIG_PATH`, or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let Ok(path) = env::var(CONFIG_PATH_ENV) else {
            return Ok(Self::default());
        };

        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }

        log::info!("Loading config from {CONFIG_PATH_ENV}='{path}'");
        Self::load(Path::new(path))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.animation.step_interval_ms == 0 {
            return Err(ConfigError::Invalid("animation.step_interval_ms must be > 0".into()));
        }
        let adjacency = self.chemistry.adjacency_distance;
        if !adjacency.is_finite() || adjacency <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "chemistry.adjacency_distance must be positive, got {adjacency}"
            )));
        }
        Ok(())
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.animation.step_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TurfConfig::default();
        assert_eq!(config.step_interval(), Duration::from_millis(2000));
        assert_eq!(config.chemistry.adjacency_distance, 30.0);
        assert!(config.storage.autosave);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = TurfConfig::from_yaml_str("animation:\n  step_interval_ms: 500\n").unwrap();
        assert_eq!(config.animation.step_interval_ms, 500);
        assert_eq!(config.chemistry, ChemistryConfig::default());
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let err = TurfConfig::from_yaml_str("animation:\n  step_interval_ms: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = TurfConfig::from_yaml_str("chemistry:\n  adjacency_distance: -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = TurfConfig::from_yaml_str("animation: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage:\n  dir: /tmp/turf\n  autosave: false").unwrap();

        let config = TurfConfig::load(file.path()).unwrap();
        assert_eq!(config.storage.dir, PathBuf::from("/tmp/turf"));
        assert!(!config.storage.autosave);

        let missing = TurfConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
