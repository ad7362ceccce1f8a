// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Environment variable loader
///
/// With a prefix of `APP`, the variable `APP_TENANT_APPS` is exposed as the
/// setting `TENANT_APPS`. Variables without the prefix are ignored.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables.
    pub fn load(&self) -> HashMap<String, String> {
        self.collect_vars(env::vars())
    }

    fn collect_vars(&self, vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        vars.filter_map(|(key, value)| match self.prefix {
            Some(ref prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|rest| !rest.is_empty())
                .map(|rest| (rest.to_string(), value)),
            None => Some((key, value)),
        })
        .collect()
    }

    /// Load a specific setting from the environment.
    pub fn load_var(&self, key: &str) -> Result<String> {
        env::var(self.full_key(key)).map_err(ConfigError::EnvError)
    }

    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    fn full_key(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
