//! Configuration module
//!
//! Loads the YAML configuration file. The raw document stays available for
//! dotted-path lookups next to the typed [`Settings`] view.

pub mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

pub use settings::{
    AgentSettings, AiSettings, AutomationSettings, DebugSettings, LlmSettings, LoggingSettings,
    MissionSettings, ModelType, Settings, VisionSettings,
};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] serde_yaml::Error),
}

/// A loaded configuration document
#[derive(Debug, Clone)]
pub struct Config {
    raw: Value,
    settings: Settings,
    path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            raw: serde_yaml::to_value(&settings).unwrap_or(Value::Null),
            settings,
            path: None,
        }
    }
}

impl Config {
    /// Parse a YAML document
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document means all defaults
        let raw = if text.trim().is_empty() {
            Value::Mapping(Default::default())
        } else {
            match serde_yaml::from_str(text)? {
                Value::Null => Value::Mapping(Default::default()),
                raw => raw,
            }
        };
        let settings: Settings = serde_yaml::from_value(raw.clone())?;
        Ok(Self {
            raw,
            settings,
            path: None,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&text)?;
        config.path = Some(path.to_path_buf());
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path`, writing the defaults there first if it does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        let mut config = Self::default();
        config.save(path)?;
        config.path = Some(path.to_path_buf());
        log::info!("Created default configuration at {}", path.display());
        Ok(config)
    }

    /// Write the typed settings to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = serde_yaml::to_string(&self.settings)?;
        fs::write(path, text).map_err(write_err)
    }

    /// Look up a value by dotted path, e.g. `vision.image_scale`
    ///
    /// Only keys present in the file are found; defaults filled in by
    /// [`Settings`] are not.
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.raw, |node, segment| node.get(segment))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// File the configuration was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_lookup() {
        let config = Config::from_yaml("vision:\n  image_scale: 0.25\nagent:\n  name: Scout\n").unwrap();
        assert_eq!(config.get("vision.image_scale").and_then(Value::as_f64), Some(0.25));
        assert_eq!(config.get("agent.name").and_then(Value::as_str), Some("Scout"));
        assert!(config.get("vision.missing").is_none());
        assert!(config.get("agent.name.deeper").is_none());
        assert_eq!(config.settings().vision.image_scale, 0.25);
        assert_eq!(config.settings().agent.target_app, "iPhone Mirroring");
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.settings().mission.max_steps, 200);
    }

    #[test]
    fn test_invalid_document() {
        let err = Config::from_yaml("mission:\n  max_steps: lots\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("default.yaml");

        let created = Config::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.path(), Some(path.as_path()));

        let loaded = Config::load_or_create(&path).unwrap();
        assert_eq!(
            loaded.get("ai.llm.model").and_then(Value::as_str),
            Some("qwen2.5:7b")
        );
        assert_eq!(loaded.get("mission.start_delay_secs").and_then(Value::as_u64), Some(3));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
