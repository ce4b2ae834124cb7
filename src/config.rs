//! # Queue Host Configuration
//!
//! Loaded from a single TOML file (default `print-queue.toml`). Every field has
//! a default, so an empty file is a valid configuration.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [queue]
//! capacity = 50
//! warn_ratio = 0.8
//!
//! [server]
//! bind = "0.0.0.0:3000"
//!
//! [[catalog.parts]]
//! id = "PART-001"
//! name = "Projector"
//! material = "Plastic & Glass"
//! status = "Available"
//! version = "v1.2"
//! unitsInInventory = 150
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Part;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Admission and notification settings for the job queue.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Maximum number of active (Pending, Printing, Paused) jobs at admission time.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Fraction of `capacity` at which the queue reports it is approaching the limit.
    #[serde(default = "default_warn_ratio")]
    pub warn_ratio: f64,
    /// Buffered change events per subscriber before it starts lagging.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            warn_ratio: default_warn_ratio(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl QueueConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Seed records for the in-memory part catalog.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.capacity == 0 {
            return Err(ConfigError::Invalid("queue.capacity must be > 0".to_string()));
        }
        if !(self.queue.warn_ratio > 0.0 && self.queue.warn_ratio <= 1.0) {
            return Err(ConfigError::Invalid(
                "queue.warn_ratio must be in (0, 1]".to_string(),
            ));
        }
        if self.queue.event_buffer == 0 {
            return Err(ConfigError::Invalid("queue.event_buffer must be > 0".to_string()));
        }
        let mut seen = HashSet::new();
        for part in &self.catalog.parts {
            if part.id.trim().is_empty() {
                return Err(ConfigError::Invalid("catalog part with empty id".to_string()));
            }
            if !seen.insert(part.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate catalog part id '{}'",
                    part.id
                )));
            }
        }
        Ok(())
    }
}

fn default_capacity() -> usize { 50 }
fn default_warn_ratio() -> f64 { 0.8 }
fn default_event_buffer() -> usize { 64 }
fn default_bind() -> String { "0.0.0.0:3000".to_string() }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.queue.capacity, 50);
        assert_eq!(config.queue.warn_ratio, 0.8);
        assert_eq!(config.queue.event_buffer, 64);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert!(config.catalog.parts.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("queue.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "[queue]\ncapacity = 5\n\n[[catalog.parts]]\nid = 'PART-001'\nname = 'Frame'\nmaterial = 'Carbon Fiber'\nunitsInInventory = 100"
        )
        .unwrap();
        file.flush().unwrap();
        let config = load_config(&file_path).unwrap();
        assert_eq!(config.queue.capacity, 5);
        // Defaults for missing fields
        assert_eq!(config.queue.warn_ratio, 0.8);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.catalog.parts.len(), 1);
        assert_eq!(config.catalog.parts[0].name, "Frame");
        assert_eq!(config.catalog.parts[0].units_in_inventory, 100);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(&file_path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config: Config = toml::from_str("[queue]\ncapacity = 0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_warn_ratio_bounds() {
        let config: Config = toml::from_str("[queue]\nwarn_ratio = 1.5").unwrap();
        assert!(config.validate().is_err());
        let config: Config = toml::from_str("[queue]\nwarn_ratio = 1.0").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_part_ids_rejected() {
        let toml = r#"
        [[catalog.parts]]
        id = "PART-001"
        name = "Frame"

        [[catalog.parts]]
        id = "PART-001"
        name = "Frame v2"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("PART-001")));
    }
}
