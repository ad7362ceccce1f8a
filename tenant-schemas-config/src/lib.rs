//! Settings bag for tenant-schemas.
//!
//! A [`ConfigManager`] holds named settings as JSON values, loaded from
//! files (JSON, TOML, `.env`), the environment, or set directly. Typed
//! getters distinguish a missing setting from one with the wrong shape.

pub mod config_service;
pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use config_service::{ConfigService, ConfigServiceBuilder};
pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tenant_schemas_log::debug;

/// Main settings manager
#[derive(Clone, Default)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Arc::default(),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Load settings from environment variables.
    ///
    /// Values are stored as strings; list getters split them on commas
    /// or parse them as JSON arrays.
    pub fn load_env(&self) -> Result<()> {
        let env_vars = EnvLoader::new(self.env_prefix.clone()).load();
        debug!("Loaded {} settings from the environment", env_vars.len());

        let mut config = self.config.write();
        for (key, value) in env_vars {
            config.insert(key, Value::String(value));
        }
        Ok(())
    }

    /// Load a `.env` file into the process environment, then load the
    /// environment.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                // A missing default .env is not an error.
                dotenvy::dotenv().ok();
            }
        }
        self.load_env()
    }

    /// Load settings from a file. Later loads override earlier ones.
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let path = path.as_ref();
        let data = ConfigLoader::new(format).load_file(path)?;
        debug!("Loaded {} settings from {}", data.len(), path.display());

        self.config.write().extend(data);
        Ok(())
    }

    /// Set a setting value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.config.write().insert(key.to_string(), json_value);
        Ok(())
    }

    /// Remove a setting, returning whether it was present.
    pub fn unset(&self, key: &str) -> bool {
        self.config.write().remove(key).is_some()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get_optional(key)?
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))
    }

    /// Get a setting, or `None` if it is not set.
    ///
    /// A present value that cannot be read as `T` is an error.
    pub fn get_optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let config = self.config.read();
        match config.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|_| ConfigError::InvalidType {
                    key: key.to_string(),
                    expected: std::any::type_name::<T>(),
                }),
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(key)
    }

    /// Get an ordered list of strings, or `None` if the setting is unset.
    ///
    /// Accepts a JSON/TOML array of strings, or a string holding either a
    /// JSON array or comma-separated entries (the environment form). An
    /// empty string is an empty list.
    pub fn get_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        let config = self.config.read();
        let invalid = || ConfigError::InvalidType {
            key: key.to_string(),
            expected: "list of strings",
        };

        match config.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(Value::String(raw)) => {
                let raw = raw.trim();
                if raw.starts_with('[') {
                    serde_json::from_str::<Vec<String>>(raw)
                        .map(Some)
                        .map_err(|_| invalid())
                } else {
                    Ok(Some(
                        raw.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect(),
                    ))
                }
            }
            Some(_) => Err(invalid()),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.config.read().contains_key(key)
    }

    /// All setting names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.config.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Merge settings from another manager; `other` wins on conflicts.
    pub fn merge(&self, other: &ConfigManager) {
        let snapshot = other.config.read().clone();
        self.config.write().extend(snapshot);
    }
}
