// ConfigService - layered settings loading

use crate::{ConfigLoader, ConfigManager, FileFormat, Result};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// High-level settings service
///
/// Wraps a [`ConfigManager`] that was populated in a fixed order:
/// `.env` file, environment variables, then settings files in the order
/// they were added. Later sources override earlier ones.
#[derive(Clone, Default)]
pub struct ConfigService {
    manager: ConfigManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manager(manager: ConfigManager) -> Self {
        Self { manager }
    }

    pub fn builder() -> ConfigServiceBuilder {
        ConfigServiceBuilder::new()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.manager.get(key)
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.manager.get_or(key, default)
    }

    pub fn get_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        self.manager.get_list(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.manager.has(key)
    }

    pub fn manager(&self) -> &ConfigManager {
        &self.manager
    }
}

/// Builder for ConfigService
#[derive(Default)]
pub struct ConfigServiceBuilder {
    prefix: Option<String>,
    load_env: bool,
    load_dotenv: bool,
    dotenv_path: Option<PathBuf>,
    files: Vec<(PathBuf, Option<FileFormat>)>,
}

impl ConfigServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only read environment variables starting with `<prefix>_`
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn load_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn load_dotenv(mut self, path: Option<PathBuf>) -> Self {
        self.load_dotenv = true;
        self.dotenv_path = path;
        self
    }

    /// Add a settings file with an explicit format.
    pub fn add_file(mut self, path: impl Into<PathBuf>, format: FileFormat) -> Self {
        self.files.push((path.into(), Some(format)));
        self
    }

    /// Add a settings file whose format is detected from its extension.
    pub fn add_auto_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), None));
        self
    }

    pub fn build(self) -> Result<ConfigService> {
        let manager = match self.prefix {
            Some(prefix) => ConfigManager::with_prefix(prefix),
            None => ConfigManager::new(),
        };

        if self.load_dotenv {
            manager.load_dotenv(self.dotenv_path.as_deref())?;
        } else if self.load_env {
            manager.load_env()?;
        }

        for (path, format) in self.files {
            let format = match format {
                Some(format) => format,
                None => ConfigLoader::auto(&path)?.format(),
            };
            manager.load_file(&path, format)?;
        }

        Ok(ConfigService::from_manager(manager))
    }
}
