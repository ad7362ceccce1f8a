//! Application Registry Snapshot
//!
//! A statically-typed view of the host's installed applications in
//! registration order. The host builds it once at startup from its own
//! plugin or module system.

use crate::store::TenantError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One installed application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Full dotted name, e.g. `django.contrib.auth`
    pub name: String,

    /// Short label, the last segment of the name (`auth`)
    pub label: String,

    /// Registration position, starting at 0
    pub position: usize,
}

impl AppConfig {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        let name = name.into();
        let label = name.rsplit('.').next().unwrap_or(&name).to_string();
        Self {
            name,
            label,
            position,
        }
    }
}

/// Ordered snapshot of installed applications
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRegistry {
    apps: Vec<AppConfig>,
}

impl AppRegistry {
    /// Build a registry from app configs in any order.
    ///
    /// Configs are sorted by position. Names must be unique.
    pub fn new(mut apps: Vec<AppConfig>) -> Result<Self, TenantError> {
        apps.sort_by_key(|app| app.position);

        let mut seen = HashSet::with_capacity(apps.len());
        for app in &apps {
            if !seen.insert(app.name.as_str()) {
                return Err(TenantError::Invalid(format!(
                    "Application {} is registered more than once",
                    app.name
                )));
            }
        }

        Ok(Self { apps })
    }

    /// Build a registry from an `INSTALLED_APPS` list, using list order
    /// as the registration position.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_schemas::AppRegistry;
    ///
    /// let registry = AppRegistry::from_installed_apps(&[
    ///     "tenant_schemas".to_string(),
    ///     "django.contrib.auth".to_string(),
    /// ])
    /// .unwrap();
    /// assert_eq!(registry.labels(), vec!["tenant_schemas", "auth"]);
    /// ```
    pub fn from_installed_apps(installed_apps: &[String]) -> Result<Self, TenantError> {
        Self::new(
            installed_apps
                .iter()
                .enumerate()
                .map(|(position, name)| AppConfig::new(name.as_str(), position))
                .collect(),
        )
    }

    pub fn apps(&self) -> &[AppConfig] {
        &self.apps
    }

    /// Full app names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.apps.iter().map(|app| app.name.as_str()).collect()
    }

    /// App labels in registration order.
    pub fn labels(&self) -> Vec<&str> {
        self.apps.iter().map(|app| app.label.as_str()).collect()
    }

    /// Index of `name` in registration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.apps.iter().position(|app| app.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
